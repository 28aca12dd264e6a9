//! Scene files using `MessagePack`.
//!
//! A scene file holds the world and the binary folder blob side by side:
//!
//! ```text
//! { magic: u32, version: u32, world: World, folders: [u8] }
//! ```
//!
//! The folder blob uses the layout of [`EntityFolders::serialize`], tagged
//! with the format version it was written with.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use scenefold_folders::{EntityFolders, FoldersConfig, LoadSummary};
use scenefold_foundation::{
    EntityMap, Error, ErrorKind, FormatVersion, InputBlob, OutputBlob, PartitionHandle, Result,
};
use scenefold_storage::{PartitionHost, World};

use crate::scene::Scene;

/// Identifies a scene file.
pub const MAGIC: u32 = u32::from_le_bytes(*b"SFLD");

#[derive(Serialize, Deserialize)]
struct SceneFile<W> {
    magic: u32,
    version: u32,
    world: W,
    folders: Vec<u8>,
}

/// What [`Scene::load_additive`] added to a scene.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditiveLoad {
    /// Partitions created for the file's partitions, in file order.
    pub partitions: Vec<PartitionHandle>,
    /// Map from the file's entities to the entities created for them.
    pub entity_map: EntityMap,
    /// Folder records brought in.
    pub folders: LoadSummary,
}

/// Serializes a scene to bytes using `MessagePack` format.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_bytes(scene: &Scene) -> Result<Vec<u8>> {
    let mut folders = OutputBlob::new();
    scene.folders().serialize(&mut folders);
    let file = SceneFile {
        magic: MAGIC,
        version: FormatVersion::LATEST.as_u32(),
        world: scene.world(),
        folders: folders.into_bytes(),
    };
    rmp_serde::to_vec_named(&file)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))
}

/// Deserializes a scene from `MessagePack` bytes.
///
/// Partitions without a root folder are given one.
///
/// # Errors
///
/// Returns an error if the bytes are not a scene file, were written by an
/// unknown version, or hold inconsistent folder data.
pub fn from_bytes(bytes: &[u8], config: FoldersConfig) -> Result<Scene> {
    let (file, version) = decode(bytes)?;
    let folders = load_folders(&file, version, config)?;
    let mut scene = Scene {
        world: file.world,
        folders,
    };
    if scene.folders.selected_folder().is_none() {
        let active = scene.world.active_partition();
        let root = scene.folders.ensure_root(active);
        scene.folders.select_folder(root, &mut scene.world);
    }
    scene.sync_active_partition();
    Ok(scene)
}

/// Saves a scene to a file using `MessagePack` format.
///
/// Creates the file if it doesn't exist, or overwrites it if it does.
///
/// # Errors
///
/// Returns an error if the file cannot be created or written to,
/// or if serialization fails.
pub fn save_to_file<P: AsRef<Path>>(scene: &Scene, path: P) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|e| io_error(format!("failed to create file '{}': {e}", path.display())))?;

    let mut writer = BufWriter::new(file);
    let bytes = to_bytes(scene)?;

    writer
        .write_all(&bytes)
        .map_err(|e| io_error(format!("failed to write to file '{}': {e}", path.display())))?;
    writer
        .flush()
        .map_err(|e| io_error(format!("failed to flush file '{}': {e}", path.display())))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), "saved scene");
    Ok(())
}

/// Loads a scene from a `MessagePack` file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or if deserialization fails.
pub fn load_from_file<P: AsRef<Path>>(path: P, config: FoldersConfig) -> Result<Scene> {
    from_bytes(&read_file(path.as_ref())?, config)
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)
        .map_err(|e| io_error(format!("failed to open file '{}': {e}", path.display())))?;

    let mut reader = BufReader::new(file);
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| io_error(format!("failed to read file '{}': {e}", path.display())))?;
    Ok(bytes)
}

impl Scene {
    /// Merges a scene file into this scene.
    ///
    /// Every partition of the file becomes a new partition here. The file's
    /// live entities are recreated in them without being filed by the
    /// selected folder, then placed in the file's folders. Colliding folder
    /// IDs are renamed. The selection and active partition are unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid scene file. The scene
    /// is unchanged in that case.
    pub fn load_additive(&mut self, bytes: &[u8]) -> Result<AdditiveLoad> {
        let (file, version) = decode(bytes)?;
        // Full validation up front; the merge below works on checked data.
        load_folders(&file, version, self.folders.config().clone())?;

        let mut targets = HashMap::new();
        let mut partitions = Vec::with_capacity(file.world.partitions().len());
        for source in file.world.partitions() {
            let partition = self.world.create_partition(source.name.clone());
            targets.insert(source.handle, partition);
            partitions.push(partition);
        }
        // Checked data always resolves; the fallback only keeps this total.
        let target = |source: Option<PartitionHandle>| {
            source
                .and_then(|source| targets.get(&source).copied())
                .unwrap_or(partitions[0])
        };

        let entity_map: EntityMap = self.with_new_entities_ignored(|scene| {
            file.world
                .entities()
                .map(|src| {
                    let dst = scene.create_entity();
                    scene.world.set_partition(dst, target(file.world.partition_of(src)));
                    (src, dst)
                })
                .collect()
        });

        let active = self.world.active_partition();
        self.world
            .set_active_partition(target(Some(file.world.active_partition())));
        let loaded = self.folders.deserialize(
            &mut InputBlob::new(&file.folders),
            &entity_map,
            true,
            version,
            &self.world,
        );
        self.world.set_active_partition(active);
        let summary = match loaded {
            Ok(summary) => summary,
            Err(err) => {
                for (_, dst) in entity_map.iter() {
                    self.destroy_entity(dst)?;
                }
                for &partition in &partitions {
                    self.world.destroy_partition(partition)?;
                }
                return Err(err);
            }
        };

        if !version.has_legacy_folders() {
            let retags = summary
                .roots
                .iter()
                .filter_map(|&root| {
                    let source = self.folders.folder(root)?.partition();
                    Some((root, targets.get(&source).copied()?))
                })
                .collect::<Vec<_>>();
            self.folders.retag_partitions(&retags);
        }
        for &partition in &partitions {
            self.folders.ensure_root(partition);
        }

        tracing::debug!(
            %version,
            partitions = partitions.len(),
            entities = entity_map.len(),
            "merged scene file"
        );
        Ok(AdditiveLoad {
            partitions,
            entity_map,
            folders: summary,
        })
    }
}

/// Decodes the envelope and checks magic and version.
fn decode(bytes: &[u8]) -> Result<(SceneFile<World>, FormatVersion)> {
    let file: SceneFile<World> = rmp_serde::from_slice(bytes)
        .map_err(|e| Error::new(ErrorKind::SerializationError(e.to_string())))?;
    if file.magic != MAGIC {
        return Err(Error::new(ErrorKind::BadMagic));
    }
    let version = FormatVersion::try_from(file.version)?;
    Ok((file, version))
}

/// Builds the folder manager described by a decoded file and checks it.
fn load_folders(
    file: &SceneFile<World>,
    version: FormatVersion,
    config: FoldersConfig,
) -> Result<EntityFolders> {
    let world = &file.world;
    if world.partitions().is_empty() {
        return Err(Error::integrity("scene file has no partitions"));
    }
    if let Some(stray) = world
        .entities()
        .find(|&e| world.partition_of(e).is_none_or(|p| !world.has_partition(p)))
    {
        return Err(Error::integrity(format!(
            "entity {stray} belongs to an unknown partition"
        )));
    }

    // Starts from a single placeholder root, which the load replaces.
    let mut folders = EntityFolders::new(&World::new(), config);
    let identity: EntityMap = world.entities().map(|e| (e, e)).collect();
    folders.deserialize(
        &mut InputBlob::new(&file.folders),
        &identity,
        false,
        version,
        world,
    )?;

    if let Some(stray) = folders
        .folders()
        .iter()
        .find(|f| !world.has_partition(f.partition()))
    {
        return Err(Error::integrity(format!(
            "folder {} belongs to unknown {}",
            stray.id(),
            stray.partition()
        )));
    }
    for partition in world.partitions() {
        folders.ensure_root(partition.handle);
    }
    folders.validate()?;
    Ok(folders)
}

fn io_error(message: String) -> Error {
    Error::new(ErrorKind::IoError(message))
}
