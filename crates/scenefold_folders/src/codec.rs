//! Binary serialization, deserialization, and cloning of folder state.
//!
//! Layout, little-endian:
//!
//! ```text
//! u32 entity_count
//! entity_count × entity record   folder u64 | next i32 | prev i32
//! u32 folder_count
//! folder_count × folder record   id u64 | parent u64 | next u64 | prev u64 |
//!                                first_child u64 | first_entity i32 |
//!                                partition u16 | pad u16 | name [u8; 64]
//! ```
//!
//! Folder references use `0` for none and entity references `-1`.
//! Formats up to [`FormatVersion::LegacyFolders`] stored a flat folder table
//! that cannot be mapped onto the tree; it is skipped and every loaded
//! entity is placed in a single folder.
//!
//! Entities missing from the [`EntityMap`] are dropped without error. This
//! is how partial and instanced loads select what they keep.

use std::collections::{HashMap, HashSet};

use scenefold_foundation::{
    EntityMap, EntityRef, Error, ErrorContext, ErrorKind, FolderId, FormatVersion, InputBlob,
    OutputBlob, PartitionHandle, Result,
};
use scenefold_storage::PartitionHost;

use crate::folder::{EntityLink, Folder, FolderName};
use crate::folders::EntityFolders;

/// What a call to [`EntityFolders::deserialize`] brought in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Entity records kept.
    pub entities: usize,
    /// Entity records dropped because the entity map left them out.
    pub dropped: usize,
    /// Root folders that were loaded, after any renaming.
    pub roots: Vec<FolderId>,
}

/// Size of a serialized entity record.
pub const ENTITY_RECORD_SIZE: usize = 16;

/// Size of a serialized folder record.
pub const FOLDER_RECORD_SIZE: usize = 5 * 8 + 4 + 2 + 2 + NAME_FIELD_SIZE;

const NAME_FIELD_SIZE: usize = 64;

/// Size of an entry in the legacy flat folder table.
const LEGACY_FOLDER_RECORD_SIZE: usize = 12;

/// Trailing legacy fields (selected folder and a reserved word).
const LEGACY_TRAILER_SIZE: usize = 8;

impl EntityFolders {
    /// Writes the entity index and folder table without any remapping.
    #[allow(clippy::cast_possible_truncation)]
    pub fn serialize(&self, out: &mut OutputBlob) {
        out.write_u32(self.entities.len() as u32);
        for link in &self.entities {
            write_link(out, link);
        }
        out.write_u32(self.folders.len() as u32);
        for folder in &self.folders {
            write_folder(out, folder);
        }
    }

    /// Reads folder state written by [`EntityFolders::serialize`] (or by a
    /// legacy version), translating entity references through `entity_map`.
    ///
    /// Non-additive loads replace all folders and entity records; additive
    /// loads append, giving loaded folders fresh IDs where they collide with
    /// existing ones. The whole blob is decoded before anything is changed,
    /// so on error the manager is left untouched.
    ///
    /// An additive load takes the loaded entities out of whatever folder
    /// they were in. Loaded roots keep the partition they were saved with,
    /// so if that partition already has a root the caller must move them
    /// with [`EntityFolders::retag_partitions`] before the tree validates.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is truncated or malformed, including a
    /// mapped entity pointer past the end of the entity records.
    ///
    /// # Panics
    ///
    /// Panics on a non-additive legacy load unless exactly one folder exists.
    #[allow(clippy::cast_possible_truncation)]
    pub fn deserialize(
        &mut self,
        input: &mut InputBlob<'_>,
        entity_map: &EntityMap,
        additive: bool,
        version: FormatVersion,
        host: &dyn PartitionHost,
    ) -> Result<LoadSummary> {
        if version.has_legacy_folders() {
            return self.deserialize_legacy(input, entity_map, additive, host);
        }

        let entity_count = input.read_count("entity", ENTITY_RECORD_SIZE)?;
        if entity_count > EntityRef::MAX_INDEX as usize + 1 {
            return Err(Error::invalid_length("entity", entity_count as i64));
        }
        // Every mapped entity below `entity_count` gets a record, so a mapped
        // pointer is only dangling when it points past the records.
        let remap = |ptr: Option<EntityRef>| match ptr {
            Some(src) if src.slot() >= entity_count && entity_map.get(src).is_some() => Err(
                Error::invalid_entity_pointer(EntityRef::encode_ptr(ptr)),
            ),
            _ => Ok(entity_map.map_ptr(ptr)),
        };

        let mut links = Vec::with_capacity(entity_count.min(entity_map.len()));
        for index in 0..entity_count {
            let record = read_link(input)?;
            if let Some(dst) = entity_map.get(EntityRef::new(index as u32)) {
                links.push((
                    dst,
                    EntityLink {
                        folder: record.folder,
                        next: remap(record.next)?,
                        prev: remap(record.prev)?,
                    },
                ));
            }
        }

        let folder_count = input.read_count("folder", FOLDER_RECORD_SIZE)?;
        let mut folders = Vec::with_capacity(folder_count);
        for _ in 0..folder_count {
            let mut folder = read_folder(input)?;
            folder.first_entity = remap(folder.first_entity)?;
            folders.push(folder);
        }

        if additive {
            self.rename_colliding(&mut folders, &mut links);
            for &(dst, _) in &links {
                if dst.slot() < self.entities.len() {
                    self.unlink(dst);
                }
            }
        } else {
            self.folders.clear();
            self.entities.clear();
        }

        let summary = LoadSummary {
            entities: links.len(),
            dropped: entity_count - links.len(),
            roots: folders.iter().filter(|f| f.is_root()).map(|f| f.id).collect(),
        };
        for (dst, link) in links {
            self.ensure_slot(dst);
            self.entities[dst.slot()] = link;
        }
        self.folders.extend(folders);
        self.repair_selection(host.active_partition());

        tracing::debug!(
            %version,
            additive,
            entities = summary.entities,
            dropped = summary.dropped,
            folders = folder_count,
            "loaded folders"
        );
        Ok(summary)
    }

    /// Gives decoded folders whose IDs are already taken a fresh ID, and
    /// rewrites every reference to them.
    fn rename_colliding(&mut self, folders: &mut [Folder], links: &mut [(EntityRef, EntityLink)]) {
        let mut reserved: HashSet<FolderId> = folders.iter().map(|f| f.id).collect();
        let mut renames = HashMap::new();
        for folder in folders.iter() {
            if self.contains(folder.id) {
                let fresh = self.generate_id_avoiding(&reserved);
                reserved.insert(fresh);
                renames.insert(folder.id, fresh);
            }
        }
        if renames.is_empty() {
            return;
        }

        let rename = |id: Option<FolderId>| id.map(|id| renames.get(&id).copied().unwrap_or(id));
        for folder in folders.iter_mut() {
            folder.id = renames.get(&folder.id).copied().unwrap_or(folder.id);
            folder.parent = rename(folder.parent);
            folder.next = rename(folder.next);
            folder.prev = rename(folder.prev);
            folder.first_child = rename(folder.first_child);
        }
        for (_, link) in links.iter_mut() {
            link.folder = rename(link.folder);
        }
        tracing::debug!(renamed = renames.len(), "renamed colliding folders");
    }

    fn deserialize_legacy(
        &mut self,
        input: &mut InputBlob<'_>,
        entity_map: &EntityMap,
        additive: bool,
        host: &dyn PartitionHost,
    ) -> Result<LoadSummary> {
        let count = read_legacy_len(input, "legacy folder")?;
        skip_records(input, count, LEGACY_FOLDER_RECORD_SIZE, "legacy folder")?;
        let names = read_legacy_len(input, "legacy name table")?;
        skip_records(input, names, 1, "legacy name table")?;
        input.skip(LEGACY_TRAILER_SIZE)?;

        let mut roots = Vec::new();
        let folder = if additive {
            let partition = host.active_partition();
            match self.root(partition) {
                Some(root) => self.emplace_folder(None, root),
                None => {
                    let root = self.create_root(partition);
                    roots.push(root);
                    root
                }
            }
        } else {
            assert_eq!(
                self.folders.len(),
                1,
                "legacy folders can only be loaded over a single folder"
            );
            self.folders[0].id
        };
        let folder_idx = self
            .folders
            .iter()
            .position(|f| f.id == folder)
            .unwrap_or_else(|| panic!("unknown folder {folder}"));

        for (_, entity) in entity_map.iter() {
            self.ensure_slot(entity);
            self.unlink(entity);
            self.attach(entity, folder_idx);
        }

        tracing::warn!(
            folders = count,
            entities = entity_map.len(),
            "legacy folder data dropped; entities placed in a single folder"
        );
        Ok(LoadSummary {
            entities: entity_map.len(),
            dropped: 0,
            roots,
        })
    }

    /// Copies the folders of `partition` into `dst`, replacing its folders
    /// and entity index.
    ///
    /// Member lists are rebuilt in source order from the entities present in
    /// `entity_map`; unmapped entities do not appear in `dst` at all.
    pub fn clone_to(&self, dst: &mut EntityFolders, partition: PartitionHandle, entity_map: &EntityMap) {
        dst.entities.clear();
        if let Some(max) = entity_map.max_destination() {
            dst.entities.resize(max.slot() + 1, EntityLink::default());
        }
        dst.folders = self
            .folders
            .iter()
            .filter(|f| f.partition == partition)
            .cloned()
            .collect();

        for folder in &mut dst.folders {
            let mut cursor = folder.first_entity.take();
            let mut prev: Option<EntityRef> = None;
            while let Some(src) = cursor {
                cursor = self.entities.get(src.slot()).and_then(|l| l.next);
                let Some(entity) = entity_map.get(src) else {
                    continue;
                };
                dst.entities[entity.slot()] = EntityLink {
                    folder: Some(folder.id),
                    next: None,
                    prev,
                };
                match prev {
                    Some(p) => dst.entities[p.slot()].next = Some(entity),
                    None => folder.first_entity = Some(entity),
                }
                prev = Some(entity);
            }
        }

        dst.selected = self.selected.filter(|id| dst.contains(*id));
        dst.repair_selection(partition);
        tracing::debug!(%partition, folders = dst.folders.len(), "cloned folders");
    }
}

fn write_link(out: &mut OutputBlob, link: &EntityLink) {
    out.write_u64(FolderId::encode(link.folder));
    out.write_i32(EntityRef::encode_ptr(link.next));
    out.write_i32(EntityRef::encode_ptr(link.prev));
}

fn read_link(input: &mut InputBlob<'_>) -> Result<EntityLink> {
    Ok(EntityLink {
        folder: FolderId::new(input.read_u64()?),
        next: EntityRef::decode_ptr(input.read_i32()?)?,
        prev: EntityRef::decode_ptr(input.read_i32()?)?,
    })
}

fn write_folder(out: &mut OutputBlob, folder: &Folder) {
    out.write_u64(folder.id.get());
    out.write_u64(FolderId::encode(folder.parent));
    out.write_u64(FolderId::encode(folder.next));
    out.write_u64(FolderId::encode(folder.prev));
    out.write_u64(FolderId::encode(folder.first_child));
    out.write_i32(EntityRef::encode_ptr(folder.first_entity));
    out.write_u16(folder.partition.0);
    out.write_zeros(2);

    let name = folder.name.as_str().as_bytes();
    out.write_bytes(name);
    out.write_zeros(NAME_FIELD_SIZE - name.len());
}

fn read_folder(input: &mut InputBlob<'_>) -> Result<Folder> {
    let offset = input.position();
    let id = FolderId::new(input.read_u64()?).ok_or_else(|| {
        Error::new(ErrorKind::MissingFolderId)
            .with_context(ErrorContext::new().with_section("folder").with_offset(offset))
    })?;
    let parent = FolderId::new(input.read_u64()?);
    let next = FolderId::new(input.read_u64()?);
    let prev = FolderId::new(input.read_u64()?);
    let first_child = FolderId::new(input.read_u64()?);
    let first_entity = EntityRef::decode_ptr(input.read_i32()?)?;
    let partition = PartitionHandle(input.read_u16()?);
    input.skip(2)?;

    let raw = input.read_bytes(NAME_FIELD_SIZE)?;
    let len = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    let name = std::str::from_utf8(&raw[..len])
        .map_err(|_| Error::new(ErrorKind::InvalidFolderName))?;

    Ok(Folder {
        id,
        parent,
        next,
        prev,
        first_child,
        first_entity,
        partition,
        name: FolderName::new(name),
    })
}

fn read_legacy_len(input: &mut InputBlob<'_>, what: &'static str) -> Result<usize> {
    let raw = input.read_i32()?;
    usize::try_from(raw).map_err(|_| Error::invalid_length(what, i64::from(raw)))
}

fn skip_records(
    input: &mut InputBlob<'_>,
    count: usize,
    record_size: usize,
    what: &'static str,
) -> Result<()> {
    let bytes = count
        .checked_mul(record_size)
        .ok_or_else(|| Error::invalid_length(what, count as i64))?;
    input.skip(bytes)
}
