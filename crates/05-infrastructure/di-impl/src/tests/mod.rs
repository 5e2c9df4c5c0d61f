mod container_tests;
mod fixtures;
