use alloc::vec::Vec;

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ScapegoatTree;
use crate::algorithm::Algorithm;
use crate::alpha::Alpha;

// Keys are written in ascending order, so the shape of the tree is not part of the format.
struct Keys<'a, K, A>(&'a ScapegoatTree<K, A>);

impl<K: Serialize, A> Serialize for Keys<'_, K, A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}

impl<K: Serialize, A> Serialize for ScapegoatTree<K, A> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ScapegoatTree", 3)?;
        state.serialize_field("alpha", &self.alpha)?;
        state.serialize_field("max_len", &self.max_len)?;
        state.serialize_field("keys", &Keys(self))?;
        state.end()
    }
}

#[derive(Deserialize)]
#[serde(rename = "ScapegoatTree", deny_unknown_fields)]
struct Repr<K> {
    alpha: Alpha,
    max_len: usize,
    keys: Vec<K>,
}

impl<'de, K, A> Deserialize<'de> for ScapegoatTree<K, A>
where
    K: Ord + Deserialize<'de>,
    A: Algorithm<K> + Default,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let Repr { alpha, max_len, keys } = Repr::deserialize(deserializer)?;

        if !keys.windows(2).all(|pair| pair[0] < pair[1]) {
            return Err(D::Error::custom("keys must be strictly increasing"));
        }
        if max_len < keys.len() {
            return Err(D::Error::custom(format_args!(
                "max_len {max_len} is smaller than the number of keys {}",
                keys.len()
            )));
        }

        Self::from_sorted(keys, alpha, max_len, A::default()).map_err(D::Error::custom)
    }
}
