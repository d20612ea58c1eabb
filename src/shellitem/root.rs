use std::fmt;

use uuid::{uuid, Uuid};

use crate::Guid;

#[cfg(feature = "serde")]
use serde::Serialize;

/// The well-known root locations a shell namespace walk can start from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum RootLocation {
    MyComputer,
    MyDocuments,
    NetworkShare,
    NetworkServer,
    NetworkPlaces,
    NetworkDomain,
    Internet,
    RecycleBin,
    ControlPanel,
    UserProfile,
    Apps,
}

const ROOT_LOCATIONS: [(Uuid, RootLocation, &str); 11] = [
    (uuid!("20d04fe0-3aea-1069-a2d8-08002b30309d"), RootLocation::MyComputer, "MY_COMPUTER"),
    (uuid!("450d8fba-ad25-11d0-98a8-0800361b1103"), RootLocation::MyDocuments, "MY_DOCUMENTS"),
    (uuid!("54a754c0-4bf1-11d1-83ee-00a0c90dc849"), RootLocation::NetworkShare, "NETWORK_SHARE"),
    (uuid!("c0542a90-4bf0-11d1-83ee-00a0c90dc849"), RootLocation::NetworkServer, "NETWORK_SERVER"),
    (uuid!("208d2c60-3aea-1069-a2d7-08002b30309d"), RootLocation::NetworkPlaces, "NETWORK_PLACES"),
    (uuid!("46e06680-4bf0-11d1-83ee-00a0c90dc849"), RootLocation::NetworkDomain, "NETWORK_DOMAIN"),
    (uuid!("871c5380-42a0-1069-a2ea-08002b30309d"), RootLocation::Internet, "INTERNET"),
    (uuid!("645ff040-5081-101b-9f08-00aa002f954e"), RootLocation::RecycleBin, "RECYCLE_BIN"),
    (uuid!("21ec2020-3aea-1069-a2dd-08002b30309d"), RootLocation::ControlPanel, "CONTROL_PANEL"),
    (uuid!("59031a47-3f72-44a7-89c5-5595fe6b30ee"), RootLocation::UserProfile, "USERPROFILE"),
    (uuid!("4234d49b-0245-4df3-b780-3893943456e1"), RootLocation::Apps, "APPS"),
];

impl RootLocation {
    /// The class GUID Windows assigns to this root.
    pub fn guid(&self) -> Guid {
        ROOT_LOCATIONS
            .iter()
            .find(|(_, location, _)| location == self)
            .map(|(uuid, _, _)| Guid::from(*uuid))
            .unwrap_or_default()
    }

    fn name(&self) -> &'static str {
        ROOT_LOCATIONS
            .iter()
            .find(|(_, location, _)| location == self)
            .map(|(_, _, name)| *name)
            .unwrap_or("UNKNOWN")
    }
}

/// The first entry of most ID lists: a 16-byte GUID naming the namespace
/// root, preceded by the type byte `0x1F` and an index byte that is ignored
/// on read and written as zero.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RootEntry {
    guid: Guid,
}

impl RootEntry {
    pub(crate) const TYPE_BYTE: u8 = 0x1f;

    /// A root entry for a well-known location.
    pub fn new(location: RootLocation) -> Self {
        Self {
            guid: location.guid(),
        }
    }

    /// A root entry for an arbitrary GUID.
    pub fn from_guid(guid: Guid) -> Self {
        Self { guid }
    }

    pub(crate) fn parse(data: &[u8]) -> crate::Result<Self> {
        if data.len() < 18 || data[0] != Self::TYPE_BYTE {
            return Err(crate::Error::Validation(
                "root entry is too short or lacks its type byte".to_string(),
            ));
        }
        let mut bytes = [0u8; 16];
        bytes.copy_from_slice(&data[2..18]);
        Ok(Self {
            guid: Guid::from_guid_bytes(bytes),
        })
    }

    pub(crate) fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![Self::TYPE_BYTE, 0x00];
        out.extend_from_slice(&self.guid.to_guid_bytes());
        out
    }

    /// The GUID stored in this entry.
    pub fn guid(&self) -> Guid {
        self.guid
    }

    /// The well-known location this entry names, if any.
    pub fn location(&self) -> Option<RootLocation> {
        ROOT_LOCATIONS
            .iter()
            .find(|(uuid, _, _)| Guid::from(*uuid) == self.guid)
            .map(|(_, location, _)| *location)
    }

    /// The symbolic name used in synthesized paths, `UNKNOWN {guid}` for
    /// GUIDs outside the table.
    pub fn name(&self) -> String {
        match self.location() {
            Some(location) => location.name().to_string(),
            None => format!("UNKNOWN {}", self.guid),
        }
    }
}

impl fmt::Display for RootEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<RootEntry: {}>", self.name())
    }
}
