//! Per-type field schemas.
//!
//! A record lists its fields once, in declaration order, each with an
//! accessor and an optional rule. Schemas are built on first use and shared
//! for the rest of the process.

use std::any::{Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::decode::config::DecodeConfig;
use crate::decode::decoder::{convert, extract_raw};
use crate::decode::error::{DecodeError, ErrorKind};
use crate::decode::field::Field;
use crate::decode::rule::{FieldRule, RuleError};
use crate::dom::Selection;

/// A type the decoder can populate.
///
/// ```ignore
/// impl Record for Player {
///     fn schema() -> Schema<Self> {
///         Schema::new()
///             .tagged("name", r#"selector:"td.mod-player .text-of""#, |p| &mut p.name)
///             .field("rating", FieldRule::content("td.mod-stat span").with_parser("rating"), |p| &mut p.rating)
///             .nested("agent", |p| &mut p.agent)
///     }
/// }
/// ```
pub trait Record: Sized + 'static {
    fn schema() -> Schema<Self>;
}

/// Ordered field list of a record type.
pub struct Schema<R> {
    entries: Vec<Entry<R>>,
}

struct Entry<R> {
    name: &'static str,
    slot: Box<dyn Slot<R>>,
}

trait Slot<R>: Send + Sync {
    fn decode(&self, record: &mut R, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<(), DecodeError>;
}

impl<R: 'static> Default for Schema<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: 'static> Schema<R> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Leaf field with an explicit rule.
    pub fn field<F>(self, name: &'static str, rule: FieldRule, access: fn(&mut R) -> &mut F) -> Self
    where
        F: Field + 'static,
    {
        self.push(
            name,
            LeafSlot {
                rule: Ok(Some(rule)),
                access,
            },
        )
    }

    /// Leaf field with a rule written as `selector:"..." source:"..." parser:"..."`.
    ///
    /// A malformed tag is reported as `InvalidRule` by every decode of this type.
    pub fn tagged<F>(self, name: &'static str, tag: &str, access: fn(&mut R) -> &mut F) -> Self
    where
        F: Field + 'static,
    {
        let rule = tag.parse::<FieldRule>().map(Some);
        self.push(name, LeafSlot { rule, access })
    }

    /// Leaf field without a rule; skipped unless every field must be tagged.
    pub fn untagged<F>(self, name: &'static str, access: fn(&mut R) -> &mut F) -> Self
    where
        F: Field + 'static,
    {
        self.push(name, LeafSlot { rule: Ok(None), access })
    }

    /// Embedded record decoded against the same node.
    pub fn nested<N: Record>(self, name: &'static str, access: fn(&mut R) -> &mut N) -> Self {
        self.push(name, NestedSlot { access })
    }

    /// Optional embedded record. An unset one is allocated only when pointer targets are allowed.
    pub fn nested_opt<N>(self, name: &'static str, access: fn(&mut R) -> &mut Option<N>) -> Self
    where
        N: Record + Default,
    {
        self.push(name, NestedOptSlot { access })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|e| e.name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn push(mut self, name: &'static str, slot: impl Slot<R> + 'static) -> Self {
        self.entries.push(Entry {
            name,
            slot: Box::new(slot),
        });
        self
    }

    /// Decode every field in declaration order, stopping at the first failure.
    pub(crate) fn apply(&self, record: &mut R, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<(), DecodeError> {
        for entry in &self.entries {
            entry
                .slot
                .decode(record, node, cfg)
                .map_err(|e| e.within(entry.name))?;
        }
        Ok(())
    }
}

struct LeafSlot<R, F> {
    rule: Result<Option<FieldRule>, RuleError>,
    access: fn(&mut R) -> &mut F,
}

impl<R, F: Field> Slot<R> for LeafSlot<R, F> {
    fn decode(&self, record: &mut R, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<(), DecodeError> {
        let rule = match &self.rule {
            Ok(Some(rule)) => rule,
            Ok(None) if cfg.require_all_fields_tagged => return Err(DecodeError::new(ErrorKind::MissingRule)),
            Ok(None) => return Ok(()),
            Err(e) => return Err(DecodeError::new(e.clone())),
        };

        let raw = extract_raw(rule, node, cfg).map_err(DecodeError::new)?;
        convert((self.access)(record), rule, &raw, cfg).map_err(DecodeError::new)
    }
}

struct NestedSlot<R, N> {
    access: fn(&mut R) -> &mut N,
}

impl<R, N: Record> Slot<R> for NestedSlot<R, N> {
    fn decode(&self, record: &mut R, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<(), DecodeError> {
        if cfg.forbid_nested_traversal {
            return Ok(());
        }
        schema_of::<N>().apply((self.access)(record), node, cfg)
    }
}

struct NestedOptSlot<R, N> {
    access: fn(&mut R) -> &mut Option<N>,
}

impl<R, N: Record + Default> Slot<R> for NestedOptSlot<R, N> {
    fn decode(&self, record: &mut R, node: &Selection<'_>, cfg: &DecodeConfig) -> Result<(), DecodeError> {
        if cfg.forbid_nested_traversal {
            return Ok(());
        }

        let slot = (self.access)(record);
        if slot.is_none() {
            if !cfg.allow_pointer_target {
                return Err(DecodeError::new(ErrorKind::TypeError(format!(
                    "`{}` is unset and pointer targets are not allowed",
                    std::any::type_name::<N>()
                ))));
            }
            *slot = Some(N::default());
        }

        match slot {
            Some(inner) => schema_of::<N>().apply(inner, node, cfg),
            None => Ok(()),
        }
    }
}

type SchemaMap = DashMap<TypeId, Arc<dyn Any + Send + Sync>>;

static SCHEMAS: OnceLock<SchemaMap> = OnceLock::new();

/// The shared schema of `R`, built on first request.
pub fn schema_of<R: Record>() -> Arc<Schema<R>> {
    let schemas = SCHEMAS.get_or_init(DashMap::new);
    let key = TypeId::of::<R>();

    let cached = schemas.get(&key).map(|entry| entry.value().clone());
    if let Some(schema) = cached.and_then(|any| any.downcast::<Schema<R>>().ok()) {
        return schema;
    }

    // Built outside the map lock; a racing builder just loses its copy.
    let built: Arc<dyn Any + Send + Sync> = Arc::new(R::schema());
    let stored = schemas.entry(key).or_insert(built).value().clone();
    match stored.downcast::<Schema<R>>() {
        Ok(schema) => schema,
        Err(_) => Arc::new(R::schema()),
    }
}
