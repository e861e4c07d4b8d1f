pub mod encoder_memory;
