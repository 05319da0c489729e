// DLC Core Library: lifecycle management & settlement of discreet log contracts
// Written in 2020 by
//     DLC Core Library contributors
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

use std::fmt;
use std::str::FromStr;

/// Numeric identifier of the settlement asset & network. Differs from
/// `bitcoin::Network` in ability to carry identifiers of chains this library
/// knows nothing about; whether such a chain is acceptable is decided by
/// [`crate::PartyConfig`].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, From)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", transparent)
)]
pub struct CoinType(#[from] u32);

impl CoinType {
    pub const BITCOIN: CoinType = CoinType(0);
    pub const TESTNET: CoinType = CoinType(1);
    pub const REGTEST: CoinType = CoinType(257);

    pub fn all_known() -> Vec<CoinType> {
        vec![CoinType::BITCOIN, CoinType::TESTNET, CoinType::REGTEST]
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// Bitcoin network the coin type settles on, if it is one of the known
    /// bitcoin chains
    pub fn network(self) -> Option<bitcoin::Network> {
        match self {
            CoinType::BITCOIN => Some(bitcoin::Network::Bitcoin),
            CoinType::TESTNET => Some(bitcoin::Network::Testnet),
            CoinType::REGTEST => Some(bitcoin::Network::Regtest),
            _ => None,
        }
    }
}

impl From<CoinType> for u32 {
    fn from(coin: CoinType) -> Self {
        coin.0
    }
}

impl TryFrom<bitcoin::Network> for CoinType {
    type Error = ();
    fn try_from(network: bitcoin::Network) -> Result<Self, Self::Error> {
        Ok(match network {
            bitcoin::Network::Bitcoin => CoinType::BITCOIN,
            bitcoin::Network::Testnet => CoinType::TESTNET,
            bitcoin::Network::Regtest => CoinType::REGTEST,
            _ => return Err(()),
        })
    }
}

impl fmt::Display for CoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network() {
            Some(network) => write!(f, "{} ({})", network, self.0),
            None => write!(f, "coin:{}", self.0),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Display, Error)]
#[display("unrecognized coin type `{0}`; use a number or one of `bitcoin`, `testnet`, `regtest`")]
pub struct CoinTypeParseError(String);

impl FromStr for CoinType {
    type Err = CoinTypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let lower = lower.strip_prefix("coin:").unwrap_or(&lower);
        bitcoin::Network::from_str(lower)
            .ok()
            .and_then(|network| CoinType::try_from(network).ok())
            .or_else(|| lower.parse::<u32>().ok().map(CoinType))
            .ok_or_else(|| CoinTypeParseError(s.to_owned()))
    }
}
