#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod codec;
pub mod config;
pub mod error;
pub mod mapper;
pub mod schema;
pub mod traits;
pub mod types;

pub use codec::{decode_id, encode_id};
pub use error::{Error, Result};
pub use mapper::{from_storage, to_storage, FlatDocument};
pub use types::{Record, SearchHit};
