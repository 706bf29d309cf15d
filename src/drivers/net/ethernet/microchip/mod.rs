pub mod enc28j60;
