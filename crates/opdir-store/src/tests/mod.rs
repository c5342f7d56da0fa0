//! Tests for the store crate.


use crate::traits::DataEntry;

fn entry(n: u8) -> DataEntry {
    DataEntry::new(1, vec![n; 16], format!("payload-{n}").into_bytes())
}
