//! Database models, one file per marketing table.

pub mod automation;
pub mod campaign;
pub mod customer;
pub mod event;
pub mod preferences;
pub mod recipient;
pub mod segment;
pub mod template;

pub use self::automation::*;
pub use self::campaign::*;
pub use self::customer::*;
pub use self::event::*;
pub use self::preferences::*;
pub use self::recipient::*;
pub use self::segment::*;
pub use self::template::*;

use serde::{Deserialize, Deserializer};

/// Patch field that tells an explicit `null` (clear) apart from an absent
/// key (keep). Use with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
