//! Property selectors for the SDK's variable getters and setters.
//!
//! Discriminants match the client library's public definitions, so a
//! property converts losslessly to the raw flag value the SDK expects.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};

macro_rules! sdk_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:expr,)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[repr(u32)]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)*
        }

        impl $name {
            /// Every variant, in discriminant order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Raw flag value passed to the SDK.
            pub fn as_raw(self) -> u32 {
                self as u32
            }
        }

        impl TryFrom<u32> for $name {
            type Error = TypesError;

            fn try_from(raw: u32) -> Result<Self, Self::Error> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|p| p.as_raw() == raw)
                    .ok_or(TypesError::UnknownProperty { kind: $kind, raw })
            }
        }
    };
}

sdk_enum! {
    /// Properties of a client (own client or others).
    ClientProperty, "client" {
        UniqueIdentifier = 0,
        Nickname = 1,
        Version = 2,
        Platform = 3,
        FlagTalking = 4,
        InputMuted = 5,
        OutputMuted = 6,
        OutputOnlyMuted = 7,
        InputHardware = 8,
        OutputHardware = 9,
        InputDeactivated = 10,
        IdleTime = 11,
        DefaultChannel = 12,
        DefaultChannelPassword = 13,
        ServerPassword = 14,
        MetaData = 15,
        IsMuted = 16,
        IsRecording = 17,
        VolumeModificator = 18,
        VersionSign = 19,
        SecurityHash = 20,
    }
}

sdk_enum! {
    /// Properties of a channel.
    ChannelProperty, "channel" {
        Name = 0,
        Topic = 1,
        Description = 2,
        Password = 3,
        Codec = 4,
        CodecQuality = 5,
        MaxClients = 6,
        MaxFamilyClients = 7,
        Order = 8,
        FlagPermanent = 9,
        FlagSemiPermanent = 10,
        FlagDefault = 11,
        FlagPassword = 12,
        CodecLatencyFactor = 13,
        CodecIsUnencrypted = 14,
        SecuritySalt = 15,
        DeleteDelay = 16,
    }
}

sdk_enum! {
    /// Properties of the virtual server a handler is connected to.
    VirtualServerProperty, "virtual server" {
        UniqueIdentifier = 0,
        Name = 1,
        WelcomeMessage = 2,
        Platform = 3,
        Version = 4,
        MaxClients = 5,
        Password = 6,
        ClientsOnline = 7,
        ChannelsOnline = 8,
        Created = 9,
        Uptime = 10,
        CodecEncryptionMode = 11,
    }
}

sdk_enum! {
    /// Connection statistics, per client or for the server connection.
    ConnectionProperty, "connection" {
        Ping = 0,
        PingDeviation = 1,
        ConnectedTime = 2,
        IdleTime = 3,
        ClientIp = 4,
        ClientPort = 5,
        ServerIp = 6,
        ServerPort = 7,
        PacketsSentSpeech = 8,
        PacketsSentKeepalive = 9,
        PacketsSentControl = 10,
        PacketsSentTotal = 11,
        BytesSentSpeech = 12,
        BytesSentKeepalive = 13,
        BytesSentControl = 14,
        BytesSentTotal = 15,
        PacketsReceivedSpeech = 16,
        PacketsReceivedKeepalive = 17,
        PacketsReceivedControl = 18,
        PacketsReceivedTotal = 19,
        BytesReceivedSpeech = 20,
        BytesReceivedKeepalive = 21,
        BytesReceivedControl = 22,
        BytesReceivedTotal = 23,
        PacketlossSpeech = 24,
        PacketlossKeepalive = 25,
        PacketlossControl = 26,
        PacketlossTotal = 27,
        Server2ClientPacketlossSpeech = 28,
        Server2ClientPacketlossKeepalive = 29,
        Server2ClientPacketlossControl = 30,
        Server2ClientPacketlossTotal = 31,
        Client2ServerPacketlossSpeech = 32,
        Client2ServerPacketlossKeepalive = 33,
        Client2ServerPacketlossControl = 34,
        Client2ServerPacketlossTotal = 35,
        BandwidthSentLastSecondSpeech = 36,
        BandwidthSentLastSecondKeepalive = 37,
        BandwidthSentLastSecondControl = 38,
        BandwidthSentLastSecondTotal = 39,
        BandwidthSentLastMinuteSpeech = 40,
        BandwidthSentLastMinuteKeepalive = 41,
        BandwidthSentLastMinuteControl = 42,
        BandwidthSentLastMinuteTotal = 43,
        BandwidthReceivedLastSecondSpeech = 44,
        BandwidthReceivedLastSecondKeepalive = 45,
        BandwidthReceivedLastSecondControl = 46,
        BandwidthReceivedLastSecondTotal = 47,
        BandwidthReceivedLastMinuteSpeech = 48,
        BandwidthReceivedLastMinuteKeepalive = 49,
        BandwidthReceivedLastMinuteControl = 50,
        BandwidthReceivedLastMinuteTotal = 51,
    }
}

sdk_enum! {
    /// Voice codecs a channel may use.
    Codec, "codec" {
        SpeexNarrowband = 0,
        SpeexWideband = 1,
        SpeexUltraWideband = 2,
        CeltMono = 3,
        OpusVoice = 4,
        OpusMusic = 5,
    }
}

sdk_enum! {
    /// Talk state of a client (`ClientProperty::FlagTalking`).
    TalkStatus, "talk status" {
        NotTalking = 0,
        Talking = 1,
        TalkingWhileDisabled = 2,
    }
}
