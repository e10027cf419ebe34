pub mod uid;
