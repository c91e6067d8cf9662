pub mod blinker;
