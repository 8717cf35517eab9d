pub mod match_worker;
