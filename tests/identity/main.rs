mod account_test;
