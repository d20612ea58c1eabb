//! Structures from the ExtraData section of the shell link: a terminated
//! sequence of `(size, signature, payload)` records appended after the
//! string data. Three signatures decode into rich structures; every other
//! block is preserved verbatim so unknown blocks survive a round-trip.

use std::io::Cursor;

use binread::{BinRead, BinReaderExt};
use byteorder::{WriteBytesExt, LE};
use encoding_rs::Encoding;
#[allow(unused)]
use log::{debug, error, info, trace, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

/// The EnvironmentVariableDataBlock structure specifies a path expressed
/// with environment variables.
pub mod environment_variable_data;

/// The IconEnvironmentDataBlock structure specifies the path to an icon,
/// encoded using environment variables.
pub mod icon_environment_data;

/// The PropertyStoreDataBlock structure holds a serialized property storage
/// ([MS-PROPSTORE]).
pub mod property_store_data;

pub use environment_variable_data::EnvironmentVariableDataBlock;
pub use icon_environment_data::IconEnvironmentDataBlock;
pub use property_store_data::{
    DecodedPropertyValue, PropertyKey, PropertyStore, PropertyStoreDataBlock, TypedPropertyValue,
};

pub(crate) const SIG_ENVIRONMENT_VARIABLE: u32 = 0xa000_0001;
pub(crate) const SIG_ICON_ENVIRONMENT: u32 = 0xa000_0007;
pub(crate) const SIG_PROPERTY_STORE: u32 = 0xa000_0009;

/// One block of the ExtraData section.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ExtraDataBlock {
    EnvironmentProps(EnvironmentVariableDataBlock),
    IconEnvironmentProps(IconEnvironmentDataBlock),
    PropertyStoreProps(PropertyStoreDataBlock),
    /// Any block with a signature this library does not interpret; the
    /// payload is carried unchanged.
    Unparsed(UnparsedDataBlock),
}

impl ExtraDataBlock {
    /// The signature this block is stored under.
    pub fn signature(&self) -> u32 {
        match self {
            Self::EnvironmentProps(_) => SIG_ENVIRONMENT_VARIABLE,
            Self::IconEnvironmentProps(_) => SIG_ICON_ENVIRONMENT,
            Self::PropertyStoreProps(_) => SIG_PROPERTY_STORE,
            Self::Unparsed(block) => block.signature,
        }
    }

    fn to_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        let payload = match self {
            Self::EnvironmentProps(block) => block.payload_bytes(codepage)?,
            Self::IconEnvironmentProps(block) => block.payload_bytes(codepage)?,
            Self::PropertyStoreProps(block) => block.payload_bytes()?,
            Self::Unparsed(block) => block.data.clone(),
        };
        let mut out = Vec::with_capacity(payload.len() + 8);
        out.write_u32::<LE>(payload.len() as u32 + 8)?;
        out.write_u32::<LE>(self.signature())?;
        out.extend_from_slice(&payload);
        Ok(out)
    }
}

impl std::fmt::Display for ExtraDataBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EnvironmentProps(block) => block.fmt(f),
            Self::IconEnvironmentProps(block) => block.fmt(f),
            Self::PropertyStoreProps(block) => block.fmt(f),
            Self::Unparsed(block) => write!(
                f,
                "ExtraDataBlock\n signature 0x{:08x}\n data: {:02x?}",
                block.signature, block.data
            ),
        }
    }
}

/// A preserved-but-uninterpreted extra data block.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct UnparsedDataBlock {
    /// The block signature.
    pub signature: u32,
    /// The payload without its size and signature words.
    pub data: Vec<u8>,
}

/// The terminated list of extra data blocks at the tail of a link file.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExtraData {
    blocks: Vec<ExtraDataBlock>,
}

impl ExtraData {
    pub fn new(blocks: Vec<ExtraDataBlock>) -> Self {
        Self { blocks }
    }

    pub fn blocks(&self) -> &[ExtraDataBlock] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<ExtraDataBlock> {
        &mut self.blocks
    }

    /// The first environment-variable block, if any.
    pub fn environment_props(&self) -> Option<&EnvironmentVariableDataBlock> {
        self.blocks.iter().find_map(|block| match block {
            ExtraDataBlock::EnvironmentProps(env) => Some(env),
            _ => None,
        })
    }

    /// All blocks serialized in order, closed by the terminal block.
    pub(crate) fn to_bytes(&self, codepage: &'static Encoding) -> crate::Result<Vec<u8>> {
        let mut out = Vec::new();
        for block in &self.blocks {
            out.extend_from_slice(&block.to_bytes(codepage)?);
        }
        out.write_u32::<LE>(0)?;
        Ok(out)
    }
}

impl BinRead for ExtraData {
    type Args = (&'static Encoding,);

    fn read_options<R: std::io::prelude::Read + std::io::prelude::Seek>(
        reader: &mut R,
        _options: &binread::ReadOptions,
        args: Self::Args,
    ) -> binread::prelude::BinResult<Self> {
        let codepage = args.0;
        let mut blocks = Vec::new();
        loop {
            let block_size: u32 = match reader.read_le() {
                Ok(size) => size,
                // a missing terminal block is treated as end of stream
                Err(binread::Error::Io(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(e) => return Err(e),
            };
            if block_size < 4 {
                break;
            }
            if block_size < 8 {
                warn!("extra data block of impossible size {block_size}, stopping");
                break;
            }
            let signature: u32 = reader.read_le()?;
            let mut payload = vec![0u8; block_size as usize - 8];
            reader.read_exact(&mut payload)?;
            debug!("extra data block 0x{signature:08x} ({} bytes)", payload.len());

            let block = match signature {
                SIG_ENVIRONMENT_VARIABLE => ExtraDataBlock::EnvironmentProps(
                    Cursor::new(payload.as_slice()).read_le_args((codepage,))?,
                ),
                SIG_ICON_ENVIRONMENT => ExtraDataBlock::IconEnvironmentProps(
                    Cursor::new(payload.as_slice()).read_le_args((codepage,))?,
                ),
                SIG_PROPERTY_STORE => ExtraDataBlock::PropertyStoreProps(
                    Cursor::new(payload.as_slice()).read_le()?,
                ),
                signature => ExtraDataBlock::Unparsed(UnparsedDataBlock {
                    signature,
                    data: payload,
                }),
            };
            blocks.push(block);
        }
        Ok(Self { blocks })
    }
}

impl std::fmt::Display for ExtraData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for block in &self.blocks {
            write!(f, "\n{block}")?;
        }
        Ok(())
    }
}
