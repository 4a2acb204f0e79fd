use rand::Rng;
use time::OffsetDateTime;

/// The two object categories the gateway accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Images,
    Music,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Images => "card-images",
            Bucket::Music => "card-music",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "card-images" => Some(Bucket::Images),
            "card-music" => Some(Bucket::Music),
            _ => None,
        }
    }
}

const SUFFIX_LEN: usize = 6;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Storage file name: `{unix-millis}-{random suffix}.{extension}`. The
/// timestamp prefix keeps names roughly sortable; the suffix makes them
/// unguessable and collision-resistant within the same millisecond.
pub fn derive_file_name<R: Rng + ?Sized>(rng: &mut R, original_name: &str) -> String {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}.{}", millis, suffix, extension_of(original_name))
}

pub fn object_key(bucket: Bucket, file_name: &str) -> String {
    format!("{}/{}", bucket.as_str(), file_name)
}

fn extension_of(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => ext,
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;
    use regex::Regex;

    #[test]
    fn bucket_round_trip() {
        assert_eq!(Bucket::parse("card-images"), Some(Bucket::Images));
        assert_eq!(Bucket::parse("card-music"), Some(Bucket::Music));
        assert_eq!(Bucket::parse("images"), None);
        assert_eq!(Bucket::Images.as_str(), "card-images");
    }

    #[test]
    fn file_name_matches_expected_pattern() {
        lazy_static! {
            static ref NAME_RE: Regex = Regex::new(r"^\d+-[a-z0-9]{6}\.jpe?g$").unwrap();
        }
        let mut rng = rand::thread_rng();
        for original in ["photo.jpg", "holiday.jpeg"] {
            let name = derive_file_name(&mut rng, original);
            assert!(NAME_RE.is_match(&name), "unexpected name {}", name);
        }
    }

    #[test]
    fn extension_is_preserved_or_defaulted() {
        assert_eq!(extension_of("song.mp3"), "mp3");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("noextension"), "bin");
        assert_eq!(extension_of(".hidden"), "bin");
        assert_eq!(extension_of("trailing."), "bin");
    }

    #[test]
    fn object_key_prefixes_the_bucket() {
        assert_eq!(
            object_key(Bucket::Music, "123-abc123.mp3"),
            "card-music/123-abc123.mp3"
        );
    }

    #[test]
    fn file_names_do_not_collide() {
        let mut rng = rand::thread_rng();
        let a = derive_file_name(&mut rng, "a.png");
        let b = derive_file_name(&mut rng, "a.png");
        assert_ne!(a, b);
    }
}
