use serde::{Deserialize, Serialize};
use std::collections::HashMap;


/// Handle value the decoder uses for "no entity"
pub const NULL_HANDLE: u64 = 0x00FF_FFFF;

/// Typed value stored in an entity's property bag
///
/// Deserialized untagged: `true` → Bool, `3` → Int, `3.5` → Float, `"x"` → Str.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PropertyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view; integers widen to float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Int(v) => Some(*v as f64),
            PropertyValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        PropertyValue::Int(v)
    }
}

impl From<u64> for PropertyValue {
    fn from(v: u64) -> Self {
        PropertyValue::Int(v as i64)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Float(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Str(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        PropertyValue::Str(v)
    }
}

/// One game object as delivered by the decoder at a point in the stream
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Small integer slot, unique among live entities (reused after deletion)
    pub index: u32,

    /// Opaque cross-reference id, stable for the entity's lifetime
    pub handle: u64,

    /// Class tag (e.g., "CDOTA_Unit_Hero_Zuus")
    pub class: String,

    /// Sparse property bag; a missing key is a valid state
    #[serde(default)]
    pub properties: HashMap<String, PropertyValue>,
}

impl Entity {
    pub fn new(index: u32, handle: u64, class: impl Into<String>) -> Self {
        Self {
            index,
            handle,
            class: class.into(),
            properties: HashMap::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(PropertyValue::as_i64)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropertyValue::as_f64)
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyValue::as_str)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropertyValue::as_bool)
    }

    /// Read a handle-valued property. Negative values and the null handle are absent.
    pub fn get_handle(&self, name: &str) -> Option<u64> {
        let raw = u64::try_from(self.get_i64(name)?).ok()?;
        (raw != NULL_HANDLE).then_some(raw)
    }

    /// Non-owning reference used by the indices
    pub fn entity_ref(&self) -> EntityRef {
        EntityRef {
            index: self.index,
            handle: self.handle,
        }
    }
}

/// Non-owning pointer into the live-entity table.
///
/// Pairs the index with the handle so a reused index never aliases a
/// previous occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityRef {
    pub index: u32,
    pub handle: u64,
}

/// Lifecycle of an entity slot as seen by this run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    Absent,
    Active,
    Removed,
}

/// Single operation flag delivered with an entity callback
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpFlag {
    Created,
    Updated,
    Entered,
    Left,
    Deleted,
}

impl OpFlag {
    const ALL: [OpFlag; 5] = [
        OpFlag::Created,
        OpFlag::Updated,
        OpFlag::Entered,
        OpFlag::Left,
        OpFlag::Deleted,
    ];

    const fn bit(self) -> u8 {
        1 << self as u8
    }
}

/// Set of operation flags for one entity callback
///
/// Serialized as a list of flag names, e.g. `["created", "entered"]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<OpFlag>", into = "Vec<OpFlag>")]
pub struct EntityOp(u8);

impl EntityOp {
    pub const CREATED: EntityOp = EntityOp(OpFlag::Created.bit());
    pub const UPDATED: EntityOp = EntityOp(OpFlag::Updated.bit());
    pub const ENTERED: EntityOp = EntityOp(OpFlag::Entered.bit());
    pub const LEFT: EntityOp = EntityOp(OpFlag::Left.bit());
    pub const DELETED: EntityOp = EntityOp(OpFlag::Deleted.bit());

    pub fn flag(self, flag: OpFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn with(self, flag: OpFlag) -> Self {
        EntityOp(self.0 | flag.bit())
    }

    /// LEFT and DELETED both end the entity's ACTIVE state
    pub fn is_removal(self) -> bool {
        self.flag(OpFlag::Left) || self.flag(OpFlag::Deleted)
    }
}

impl From<Vec<OpFlag>> for EntityOp {
    fn from(flags: Vec<OpFlag>) -> Self {
        flags
            .into_iter()
            .fold(EntityOp::default(), |op, flag| op.with(flag))
    }
}

impl From<EntityOp> for Vec<OpFlag> {
    fn from(op: EntityOp) -> Self {
        OpFlag::ALL.into_iter().filter(|f| op.flag(*f)).collect()
    }
}
