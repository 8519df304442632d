//! Column chunk metadata parsed from a parquet footer.

use parquet::file::metadata::ParquetMetaDataReader;
use ra_error::{RaError, Result};
use std::collections::{BTreeMap, HashMap};
use std::hash::{DefaultHasher, Hash, Hasher};

/// Length of the parquet trailer: metadata length (u32 LE) then magic.
pub const FOOTER_LENGTH: usize = 8;

const PARQUET_MAGIC: &[u8; 4] = b"PAR1";

/// One column chunk of one row group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMetadata {
    pub row_group_index: usize,
    /// Dotted column path, e.g. `address.zip`.
    pub column_name: String,
    pub start_offset: u64,
    pub compressed_size: u64,
    /// Hash of the column path; equal across row groups of one column.
    pub schema_hash: u64,
}

impl ColumnMetadata {
    /// Offset one past the last byte of the chunk.
    pub fn end_offset(&self) -> u64 {
        self.start_offset + self.compressed_size
    }

    /// Whether `pos` lies within the chunk.
    pub fn contains(&self, pos: u64) -> bool {
        self.start_offset <= pos && pos < self.end_offset()
    }
}

/// Lookup tables over every column chunk of one object.
///
/// Built in one go from a decoded footer, never updated afterwards.
#[derive(Debug, Default)]
pub struct ColumnMappers {
    offset_index: BTreeMap<u64, ColumnMetadata>,
    name_index: HashMap<String, Vec<ColumnMetadata>>,
}

impl ColumnMappers {
    /// Index `columns` by start offset and by name.
    pub fn new(columns: impl IntoIterator<Item = ColumnMetadata>) -> Self {
        let mut mappers = Self::default();
        for column in columns {
            mappers
                .name_index
                .entry(column.column_name.clone())
                .or_default()
                .push(column.clone());
            mappers.offset_index.insert(column.start_offset, column);
        }
        mappers
    }

    /// The chunk containing byte `pos`.
    pub fn column_at(&self, pos: u64) -> Option<&ColumnMetadata> {
        self.offset_index
            .range(..=pos)
            .next_back()
            .map(|(_, column)| column)
            .filter(|column| column.contains(pos))
    }

    /// The chunk starting exactly at `offset`.
    pub fn column_starting_at(&self, offset: u64) -> Option<&ColumnMetadata> {
        self.offset_index.get(&offset)
    }

    /// Every chunk of the column `name`, in row group order.
    pub fn columns_named(&self, name: &str) -> &[ColumnMetadata] {
        self.name_index.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of column chunks.
    pub fn len(&self) -> usize {
        self.offset_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offset_index.is_empty()
    }
}

/// Size of the footer (metadata plus trailer) announced by the trailer at
/// the end of `tail`.
pub fn footer_length(tail: &[u8]) -> Result<usize> {
    if tail.len() < FOOTER_LENGTH {
        return Err(RaError::Parse(format!(
            "parquet trailer needs {} bytes, got {}",
            FOOTER_LENGTH,
            tail.len()
        )));
    }
    let trailer = &tail[tail.len() - FOOTER_LENGTH..];
    if &trailer[4..] != PARQUET_MAGIC {
        return Err(RaError::Parse(
            "missing parquet magic at end of object".to_string(),
        ));
    }
    let metadata_length = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    Ok(metadata_length as usize + FOOTER_LENGTH)
}

/// Decode the footer at the end of `tail` into column mappers.
///
/// `tail` must hold the whole footer, see [`footer_length`].
pub fn parse_footer(tail: &[u8]) -> Result<ColumnMappers> {
    let footer = footer_length(tail)?;
    if footer > tail.len() {
        return Err(RaError::Parse(format!(
            "parquet footer is {} bytes but only {} were read",
            footer,
            tail.len()
        )));
    }

    let metadata = &tail[tail.len() - footer..tail.len() - FOOTER_LENGTH];
    let metadata = ParquetMetaDataReader::decode_metadata(metadata)
        .map_err(|e| RaError::Parse(format!("invalid parquet metadata: {}", e)))?;

    let mut columns = Vec::new();
    for (row_group_index, row_group) in metadata.row_groups().iter().enumerate() {
        for chunk in row_group.columns() {
            let (start_offset, compressed_size) = chunk.byte_range();
            if compressed_size == 0 {
                continue;
            }
            let column_name = chunk.column_path().string();
            columns.push(ColumnMetadata {
                row_group_index,
                schema_hash: schema_hash(&column_name),
                column_name,
                start_offset,
                compressed_size,
            });
        }
    }

    Ok(ColumnMappers::new(columns))
}

fn schema_hash(column_name: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    column_name.hash(&mut hasher);
    hasher.finish()
}
