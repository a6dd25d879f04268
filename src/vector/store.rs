//! Append-only in-memory vector storage.
//!
//! Vectors live in one contiguous row-major `Vec<f32>`; the entry at
//! storage position `p` occupies `data[p * dim..(p + 1) * dim]`. Positions
//! are assigned at insertion, never reused, and never change.
//!
//! # Duplicate ids
//!
//! Behavior on re-inserting an id is governed by [`DuplicateIdPolicy`]:
//! - `Alias`: the new entry is appended and the id lookup points at it. The
//!   old entry stays in storage and is still scanned by search, so a search
//!   can return the same id twice with different similarities.
//! - `Reject`: the insert fails with `VectorError::DuplicateId` and the
//!   store is left unchanged.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{VectorError, VectorResult};
use crate::vector::types::{DocumentId, VectorDimension};

/// What to do when `add` sees an id that is already indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateIdPolicy {
    /// Keep both physical entries; the id lookup follows the newest.
    #[default]
    Alias,
    /// Fail the insert.
    Reject,
}

/// Append-only collection of `(id, vector)` entries.
#[derive(Debug, Clone)]
pub struct VectorStore {
    dimension: VectorDimension,

    /// Row-major vector data, `len == ids.len() * dimension`.
    data: Vec<f32>,

    /// Id of the entry at each storage position.
    ids: Vec<DocumentId>,

    /// Latest storage position for each id.
    id_to_position: HashMap<DocumentId, usize>,

    duplicate_policy: DuplicateIdPolicy,
}

impl VectorStore {
    /// Creates an empty store with the default (`Alias`) duplicate policy.
    #[must_use]
    pub fn new(dimension: VectorDimension) -> Self {
        Self::with_policy(dimension, DuplicateIdPolicy::default())
    }

    #[must_use]
    pub fn with_policy(dimension: VectorDimension, duplicate_policy: DuplicateIdPolicy) -> Self {
        Self {
            dimension,
            data: Vec::new(),
            ids: Vec::new(),
            id_to_position: HashMap::new(),
            duplicate_policy,
        }
    }

    /// Appends a vector and returns its storage position.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if `vector.len() != dimension`.
    /// - `DuplicateId` if the id exists and the policy is `Reject`.
    ///
    /// On error nothing is inserted.
    pub fn add(&mut self, id: DocumentId, vector: &[f32]) -> VectorResult<usize> {
        self.dimension.validate_vector(vector)?;

        let position = self.ids.len();
        match self.id_to_position.entry(id) {
            Entry::Occupied(mut slot) => match self.duplicate_policy {
                DuplicateIdPolicy::Reject => {
                    return Err(VectorError::DuplicateId { id: id.get() });
                }
                DuplicateIdPolicy::Alias => {
                    warn!(
                        "Document {id} re-added at position {position}; entry at position {} stays searchable",
                        slot.get()
                    );
                    slot.insert(position);
                }
            },
            Entry::Vacant(slot) => {
                slot.insert(position);
            }
        }

        self.data.extend_from_slice(vector);
        self.ids.push(id);
        Ok(position)
    }

    /// Appends many vectors, all or nothing.
    ///
    /// Every vector (and, under `Reject`, every id) is validated before the
    /// first insert, so a failure leaves the store unchanged.
    pub fn add_batch<'a, I>(&mut self, entries: I) -> VectorResult<usize>
    where
        I: IntoIterator<Item = (DocumentId, &'a [f32])>,
    {
        let entries: Vec<(DocumentId, &[f32])> = entries.into_iter().collect();

        for (_, vector) in &entries {
            self.dimension.validate_vector(vector)?;
        }
        if self.duplicate_policy == DuplicateIdPolicy::Reject {
            let mut seen = std::collections::HashSet::with_capacity(entries.len());
            for (id, _) in &entries {
                if self.id_to_position.contains_key(id) || !seen.insert(*id) {
                    return Err(VectorError::DuplicateId { id: id.get() });
                }
            }
        }

        self.data.reserve(entries.len() * self.dimension.get());
        self.ids.reserve(entries.len());
        for (id, vector) in &entries {
            self.add(*id, vector)?;
        }
        Ok(entries.len())
    }

    /// Number of physical entries, aliased duplicates included.
    #[must_use]
    pub fn count(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Number of distinct ids.
    #[must_use]
    pub fn unique_ids(&self) -> usize {
        self.id_to_position.len()
    }

    #[must_use]
    pub fn dimension(&self) -> VectorDimension {
        self.dimension
    }

    #[must_use]
    pub fn duplicate_policy(&self) -> DuplicateIdPolicy {
        self.duplicate_policy
    }

    /// Vector stored at `position`.
    #[must_use]
    pub fn vector_at(&self, position: usize) -> Option<&[f32]> {
        let dim = self.dimension.get();
        let start = position.checked_mul(dim)?;
        let end = start.checked_add(dim)?;
        self.data.get(start..end)
    }

    /// Id stored at `position`.
    #[must_use]
    pub fn id_at(&self, position: usize) -> Option<DocumentId> {
        self.ids.get(position).copied()
    }

    /// Latest storage position for `id`.
    #[must_use]
    pub fn position_of(&self, id: DocumentId) -> Option<usize> {
        self.id_to_position.get(&id).copied()
    }

    #[must_use]
    pub fn contains(&self, id: DocumentId) -> bool {
        self.id_to_position.contains_key(&id)
    }

    /// Most recently added vector for `id`.
    #[must_use]
    pub fn get(&self, id: DocumentId) -> Option<&[f32]> {
        self.position_of(id).and_then(|p| self.vector_at(p))
    }

    /// Id and vector of every entry, in storage order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (DocumentId, &[f32])> + '_ {
        self.ids
            .iter()
            .copied()
            .zip(self.data.chunks_exact(self.dimension.get()))
    }

    /// Ids of every entry, indexed by position.
    pub(crate) fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    /// Row-major vector data, indexed by position.
    pub(crate) fn data(&self) -> &[f32] {
        &self.data
    }

    /// Approximate heap footprint in bytes.
    ///
    /// Counts the struct itself, the raw vector data, the position-to-id
    /// table and one `(id, position)` pair per entry for the lookup map.
    /// Allocator slack and hash table control bytes are not included.
    #[must_use]
    pub fn memory_estimate(&self) -> usize {
        let count = self.count();
        let base = std::mem::size_of::<Self>();
        let vectors = count * self.dimension.get() * std::mem::size_of::<f32>();
        let ids = count * std::mem::size_of::<DocumentId>();
        let map = count * (std::mem::size_of::<DocumentId>() + std::mem::size_of::<usize>());
        base + vectors + ids + map
    }
}
