use crate::PhpArray;

use serde::de::{Deserialize, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserializer;

use std::fmt;
use std::hash::BuildHasher;
use std::marker::PhantomData;

pub struct PhpArrayVisitor<V, S> {
    marker: PhantomData<fn() -> PhpArray<V, S>>,
}

impl<V, S> PhpArrayVisitor<V, S> {
    fn new() -> Self {
        PhpArrayVisitor {
            marker: PhantomData,
        }
    }
}

impl<'de, V, S> Visitor<'de> for PhpArrayVisitor<V, S>
where
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    type Value = PhpArray<V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with string keys")
    }

    fn visit_map<M>(self, mut access: M) -> Result<Self::Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut array = PhpArray::with_hasher(S::default());
        while let Some((key, value)) = access.next_entry::<String, V>()? {
            array.put(key, value);
        }
        Ok(array)
    }
}

impl<'de, V, S> Deserialize<'de> for PhpArray<V, S>
where
    V: Deserialize<'de>,
    S: BuildHasher + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(PhpArrayVisitor::<V, S>::new())
    }
}

/// Serializes as a map in insertion order.
impl<V, H> Serialize for PhpArray<V, H>
where
    V: Serialize,
    H: BuildHasher,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (k, v) in self.iter() {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
