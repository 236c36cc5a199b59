mod store_ops_tests;
