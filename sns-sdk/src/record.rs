use std::fmt;
use std::str::FromStr;

use crate::errors::SnsError;

/// How a record's human-readable value maps onto its on-chain bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// Base58 account address, stored as the raw 32 bytes.
    RawAddress,
    /// `0x`-prefixed hex, stored as 20 raw bytes.
    EvmHex,
    /// Bech32 with the given human-readable part, stored as the raw payload.
    Bech32(&'static str),
    /// Base58 text decoded to raw bytes.
    Base58,
    /// Base58-alphabet text stored verbatim as ASCII.
    Base58Text,
    /// IPv4 dotted quad.
    DottedQuad,
    /// IPv6 colon-hex.
    ColonHex,
    Utf8,
    /// Punycode-normalised label stored as UTF-8.
    PunycodeUtf8,
}

/// Every record kind the naming service knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Record {
    Ipfs,
    Arwv,
    Sol,
    Eth,
    Btc,
    Ltc,
    Doge,
    Email,
    Url,
    Discord,
    Github,
    Reddit,
    Twitter,
    Telegram,
    Pic,
    Shdw,
    Point,
    Bsc,
    Injective,
    Backpack,
    A,
    AAAA,
    Cname,
    Txt,
    Background,
    Base,
    Ipns,
}

impl Record {
    pub const ALL: [Record; 27] = [
        Record::Ipfs,
        Record::Arwv,
        Record::Sol,
        Record::Eth,
        Record::Btc,
        Record::Ltc,
        Record::Doge,
        Record::Email,
        Record::Url,
        Record::Discord,
        Record::Github,
        Record::Reddit,
        Record::Twitter,
        Record::Telegram,
        Record::Pic,
        Record::Shdw,
        Record::Point,
        Record::Bsc,
        Record::Injective,
        Record::Backpack,
        Record::A,
        Record::AAAA,
        Record::Cname,
        Record::Txt,
        Record::Background,
        Record::Base,
        Record::Ipns,
    ];

    /// Name used on chain when deriving record keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Record::Ipfs => "IPFS",
            Record::Arwv => "ARWV",
            Record::Sol => "SOL",
            Record::Eth => "ETH",
            Record::Btc => "BTC",
            Record::Ltc => "LTC",
            Record::Doge => "DOGE",
            Record::Email => "email",
            Record::Url => "url",
            Record::Discord => "discord",
            Record::Github => "github",
            Record::Reddit => "reddit",
            Record::Twitter => "twitter",
            Record::Telegram => "telegram",
            Record::Pic => "pic",
            Record::Shdw => "SHDW",
            Record::Point => "POINT",
            Record::Bsc => "BSC",
            Record::Injective => "INJ",
            Record::Backpack => "backpack",
            Record::A => "A",
            Record::AAAA => "AAAA",
            Record::Cname => "CNAME",
            Record::Txt => "TXT",
            Record::Background => "background",
            Record::Base => "BASE",
            Record::Ipns => "IPNS",
        }
    }

    /// Fixed byte width of the serialized content, `None` for text records.
    pub fn width(&self) -> Option<usize> {
        match self {
            Record::Sol | Record::Shdw | Record::Background => Some(32),
            Record::Eth | Record::Bsc | Record::Base | Record::Injective => Some(20),
            Record::Btc | Record::Ltc | Record::Doge => Some(25),
            Record::Ipfs => Some(46),
            Record::Arwv => Some(43),
            Record::A => Some(4),
            Record::AAAA => Some(16),
            Record::Email
            | Record::Url
            | Record::Discord
            | Record::Github
            | Record::Reddit
            | Record::Twitter
            | Record::Telegram
            | Record::Pic
            | Record::Point
            | Record::Backpack
            | Record::Cname
            | Record::Txt
            | Record::Ipns => None,
        }
    }

    pub fn encoding(&self) -> Encoding {
        match self {
            Record::Sol | Record::Shdw => Encoding::RawAddress,
            Record::Eth | Record::Bsc | Record::Base => Encoding::EvmHex,
            Record::Injective => Encoding::Bech32("inj"),
            Record::Btc | Record::Ltc | Record::Doge | Record::Background => Encoding::Base58,
            Record::Ipfs | Record::Arwv => Encoding::Base58Text,
            Record::A => Encoding::DottedQuad,
            Record::AAAA => Encoding::ColonHex,
            Record::Cname | Record::Txt => Encoding::PunycodeUtf8,
            Record::Email
            | Record::Url
            | Record::Discord
            | Record::Github
            | Record::Reddit
            | Record::Twitter
            | Record::Telegram
            | Record::Pic
            | Record::Point
            | Record::Backpack
            | Record::Ipns => Encoding::Utf8,
        }
    }

    pub fn is_text(&self) -> bool {
        self.width().is_none()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Record {
    type Err = SnsError;

    /// Accepts the on-chain name in any case, plus a few long-form aliases.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.to_ascii_uppercase();
        let alias = match upper.as_str() {
            "INJECTIVE" => Some(Record::Injective),
            "ARWEAVE" => Some(Record::Arwv),
            "SHADOW" => Some(Record::Shdw),
            "IPV4" => Some(Record::A),
            "IPV6" => Some(Record::AAAA),
            _ => None,
        };
        alias
            .or_else(|| {
                Record::ALL
                    .iter()
                    .copied()
                    .find(|r| r.as_str().eq_ignore_ascii_case(&upper))
            })
            .ok_or_else(|| SnsError::UnknownRecord(s.to_string()))
    }
}
