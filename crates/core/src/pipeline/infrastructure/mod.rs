pub mod periodic_ticker;
