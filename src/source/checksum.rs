use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

static PUB_DATE_REGEX: OnceLock<Regex> = OnceLock::new();
static COMMENT_OPEN_REGEX: OnceLock<Regex> = OnceLock::new();
static COMMENT_CLOSE_REGEX: OnceLock<Regex> = OnceLock::new();

fn pub_date_regex() -> &'static Regex {
    PUB_DATE_REGEX
        .get_or_init(|| Regex::new(r"(?s)<pubDate>.*?</pubDate>").expect("pubDate pattern is valid"))
}

/// Digest algorithms a [`Checksum`] can be generated with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Md5,
    /// SHA-256 over the content with every `<pubDate>…</pubDate>` removed.
    /// Matches the checkpoints Homebrew Cask computes for Sparkle appcasts.
    SparkleSha256,
}

impl ChecksumAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "sha256",
            ChecksumAlgorithm::Md5 => "md5",
            ChecksumAlgorithm::SparkleSha256 => "sparkle-sha256",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(ChecksumAlgorithm::Sha256),
            "md5" => Ok(ChecksumAlgorithm::Md5),
            "sparkle-sha256" | "sparkle" => Ok(ChecksumAlgorithm::SparkleSha256),
            other => Err(format!("unknown checksum algorithm {other:?}")),
        }
    }
}

/// A content digest tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checksum {
    algorithm: ChecksumAlgorithm,
    digest: Vec<u8>,
}

impl Checksum {
    pub fn generate(algorithm: ChecksumAlgorithm, content: &[u8]) -> Self {
        let digest = match algorithm {
            ChecksumAlgorithm::Sha256 => Sha256::digest(content).to_vec(),
            ChecksumAlgorithm::Md5 => md5::compute(content).0.to_vec(),
            ChecksumAlgorithm::SparkleSha256 => Sha256::digest(strip_pub_dates(content)).to_vec(),
        };

        Self { algorithm, digest }
    }

    pub fn algorithm(&self) -> ChecksumAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.digest)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.to_hex())
    }
}

fn strip_pub_dates(content: &[u8]) -> Cow<'_, [u8]> {
    pub_date_regex().replace_all(content, &b""[..])
}

/// Removes `<!--` / `-->` markers (and the whitespace hugging them) while
/// keeping whatever was commented out.
///
/// Some Sparkle feed generators comment out older items; uncommenting before
/// unmarshalling brings them back.
pub fn uncomment(content: &[u8]) -> Vec<u8> {
    let open = COMMENT_OPEN_REGEX
        .get_or_init(|| Regex::new(r"<!--\s*").expect("comment open pattern is valid"));
    let close = COMMENT_CLOSE_REGEX
        .get_or_init(|| Regex::new(r"\s*-->").expect("comment close pattern is valid"));

    let opened = open.replace_all(content, &b""[..]);
    close.replace_all(&opened, &b""[..]).into_owned()
}
