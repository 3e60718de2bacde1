mod release_test;
