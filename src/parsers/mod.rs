pub mod lng;
