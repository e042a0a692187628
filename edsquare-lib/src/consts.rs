/// Fixed configuration for `bincode` serialization and deserialization.
pub const EDSQUARE_BINCODE_CONFIG: bincode::config::Configuration = bincode::config::standard();

/// Registry name of the GF(2^16) Leopard-style Reed-Solomon codec.
pub const LEOPARD: &str = "leopard";

/// Registry name of the GF(2^8) Reed-Solomon codec.
pub const RS_GF8: &str = "rs-gf8";
