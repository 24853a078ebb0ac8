//! Named objects and methods with their fixed UIDs.

use token::Value;

use crate::uid::Uid;

macro_rules! catalog {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = ($value:literal, $display:literal), )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every entry, in declaration order.
            pub const ALL: &'static [Self] = &[ $( Self::$variant, )+ ];

            /// Returns the fixed UID.
            #[must_use]
            pub const fn uid(self) -> Uid {
                match self {
                    $( Self::$variant => Uid::from_u64($value), )+
                }
            }

            /// Returns the name used in the TCG documents.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => $display, )+
                }
            }

            /// Reverse lookup.
            #[must_use]
            pub fn from_uid(uid: Uid) -> Option<Self> {
                match uid.as_u64() {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }

        impl From<$name> for Uid {
            fn from(entry: $name) -> Self {
                entry.uid()
            }
        }

        impl From<$name> for Value {
            fn from(entry: $name) -> Self {
                entry.uid().into()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

catalog! {
    /// Security providers, authorities, tables and table rows.
    pub enum Object {
        /// Session manager; invoking object for StartSession and Properties.
        SessionManager = (0x0000_0000_0000_00FF, "SMUID"),
        /// The SP the session is open to.
        ThisSp = (0x0000_0000_0000_0001, "ThisSP"),
        AdminSp = (0x0000_0205_0000_0001, "AdminSP"),
        LockingSp = (0x0000_0205_0000_0002, "LockingSP"),
        Anybody = (0x0000_0009_0000_0001, "Anybody"),
        Sid = (0x0000_0009_0000_0006, "SID"),
        Admin1 = (0x0000_0009_0001_0001, "Admin1"),
        User1 = (0x0000_0009_0003_0001, "User1"),
        User2 = (0x0000_0009_0003_0002, "User2"),
        Psid = (0x0000_0009_0001_FF01, "PSID"),
        LockingRangeGlobal = (0x0000_0802_0000_0001, "Locking_GlobalRange"),
        LockingRangeAceReadLocked = (0x0000_0008_0003_E001, "ACE_Locking_Range1_Set_RdLocked"),
        LockingRangeAceWriteLocked = (0x0000_0008_0003_E801, "ACE_Locking_Range1_Set_WrLocked"),
        MbrControl = (0x0000_0803_0000_0001, "MBRControl"),
        Mbr = (0x0000_0804_0000_0000, "MBR"),
        SpTable = (0x0000_0205_0000_0000, "SP"),
        AuthorityTable = (0x0000_0009_0000_0000, "Authority"),
        AccessControlTable = (0x0000_0007_0000_0000, "AccessControl"),
        CPinTable = (0x0000_000B_0000_0000, "C_PIN"),
        LockingInfoTable = (0x0000_0801_0000_0001, "LockingInfo"),
        CPinMsid = (0x0000_000B_0000_8402, "C_PIN_MSID"),
        CPinSid = (0x0000_000B_0000_0001, "C_PIN_SID"),
        CPinAdmin1 = (0x0000_000B_0001_0001, "C_PIN_Admin1"),
        CPinUser1 = (0x0000_000B_0003_0001, "C_PIN_User1"),
        KAes256GlobalRange = (0x0000_0806_0000_0001, "K_AES_256_GlobalRange_Key"),
        /// Half-UID naming the authority-object-ref column type in ACE expressions.
        HalfAuthorityObjectRef = (0x0000_0C05_FFFF_FFFF, "Half_UID_Authority_object_ref"),
        /// Half-UID naming the boolean ACE operator in ACE expressions.
        HalfBooleanAce = (0x0000_040E_FFFF_FFFF, "Half_UID_Boolean_ACE"),
    }
}

catalog! {
    /// Methods invocable through a Call token.
    pub enum Method {
        Properties = (0x0000_0000_0000_FF01, "Properties"),
        StartSession = (0x0000_0000_0000_FF02, "StartSession"),
        SyncSession = (0x0000_0000_0000_FF03, "SyncSession"),
        CloseSession = (0x0000_0000_0000_FF06, "CloseSession"),
        Revert = (0x0000_0006_0000_0202, "Revert"),
        Activate = (0x0000_0006_0000_0203, "Activate"),
        Next = (0x0000_0006_0000_0008, "Next"),
        GetAcl = (0x0000_0006_0000_000D, "GetACL"),
        GenKey = (0x0000_0006_0000_0010, "GenKey"),
        RevertSp = (0x0000_0006_0000_0011, "RevertSP"),
        Get = (0x0000_0006_0000_0016, "Get"),
        Set = (0x0000_0006_0000_0017, "Set"),
        Authenticate = (0x0000_0006_0000_001C, "Authenticate"),
        Random = (0x0000_0006_0000_0601, "Random"),
    }
}

impl Method {
    /// Methods the device may take far longer than a Get/Set to answer.
    /// Transports should apply an extended timeout to these.
    #[must_use]
    pub const fn is_long_running(self) -> bool {
        matches!(self, Self::Revert | Self::RevertSp | Self::GenKey)
    }

    /// Session-manager methods, invoked on [`Object::SessionManager`].
    #[must_use]
    pub const fn is_session_manager(self) -> bool {
        matches!(
            self,
            Self::Properties | Self::StartSession | Self::SyncSession | Self::CloseSession
        )
    }
}
