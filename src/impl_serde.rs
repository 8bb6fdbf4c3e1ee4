#![cfg_attr(docsrs, doc(cfg(feature = "serde")))]

//! Provides [`serde::Serialize`] support for the date and time types, which
//! serialize as their RFC 3339 text.
//!
//! The [`serde::Serialize`] impls for [`Value`](crate::Value) and
//! [`Table`](crate::Table) live in `value.rs` and `table.rs`.

use crate::{LocalDate, LocalDateTime, LocalTime, OffsetDateTime};

macro_rules! impl_serialize_as_str {
    ($($ty:ty),*) => {$(
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.collect_str(self)
            }
        }
    )*};
}

impl_serialize_as_str!(LocalDate, LocalTime, LocalDateTime, OffsetDateTime);
