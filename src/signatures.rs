// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! OpenPGP trust anchoring.

The `Release` index is only trusted after its detached signature verifies
against a provisioned keyring. Keyrings are OpenPGP public key bundles in
either binary or ASCII armored form; signatures are `Release.gpg` style
detached signatures. Verification is in-process via the `pgp` crate.
*/

use {
    crate::error::{DebrootError, Result},
    pgp::{Deserializable, SignedPublicKey, StandaloneSignature},
    std::{fs, io::Cursor, path::Path},
};

fn basename(path: &Path) -> String {
    path.file_name()
        .map(|x| x.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn is_armored(data: &[u8]) -> bool {
    data.starts_with(b"-----BEGIN")
}

/// A bundle of trusted OpenPGP public keys.
pub struct Keyring {
    keys: Vec<SignedPublicKey>,
}

impl Keyring {
    /// Load a keyring from a file.
    ///
    /// Both binary key bundles (e.g. `ubuntu-archive-keyring.gpg`) and ASCII
    /// armored bundles are accepted. A keyring yielding no public keys is an
    /// error naming the file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read(path)?;

        let keys = if is_armored(&data) {
            SignedPublicKey::from_armor_many(Cursor::new(&data))?
                .0
                .collect::<pgp::errors::Result<Vec<_>>>()?
        } else {
            SignedPublicKey::from_bytes_many(Cursor::new(&data))
                .collect::<pgp::errors::Result<Vec<_>>>()?
        };

        if keys.is_empty() {
            return Err(DebrootError::KeyringEmpty(basename(path)));
        }

        Ok(Self { keys })
    }

    /// Number of primary keys in the keyring.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the keyring holds no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over primary keys in the keyring.
    pub fn iter_keys(&self) -> impl Iterator<Item = &SignedPublicKey> {
        self.keys.iter()
    }
}

/// Verify a detached signature over a file against a keyring.
///
/// The signature file may be armored (`Release.gpg` style) or binary and may
/// carry multiple signature packets. Verification succeeds if any signature
/// validates against any primary key or subkey in the keyring. Failure is an
/// error naming the signed artifact.
pub fn verify_detached(data_path: &Path, signature_path: &Path, keyring: &Keyring) -> Result<()> {
    let content = fs::read(data_path)?;
    let signature_data = fs::read(signature_path)?;

    let signatures = if is_armored(&signature_data) {
        StandaloneSignature::from_armor_many(Cursor::new(&signature_data))?
            .0
            .collect::<pgp::errors::Result<Vec<_>>>()?
    } else {
        StandaloneSignature::from_bytes_many(Cursor::new(&signature_data))
            .collect::<pgp::errors::Result<Vec<_>>>()?
    };

    for signature in &signatures {
        for key in keyring.iter_keys() {
            if signature.verify(key, &content).is_ok() {
                return Ok(());
            }

            for subkey in &key.public_subkeys {
                if signature.verify(subkey, &content).is_ok() {
                    return Ok(());
                }
            }
        }
    }

    Err(DebrootError::SignatureInvalid(basename(data_path)))
}

#[cfg(test)]
mod test {
    use {
        super::*,
        chrono::SubsecRound,
        pgp::{
            crypto::{HashAlgorithm, SymmetricKeyAlgorithm},
            packet::{Packet, SignatureConfig, SignatureType, Subpacket},
            types::{CompressionAlgorithm, KeyTrait, KeyVersion, SecretKeyTrait},
            KeyType, SecretKeyParamsBuilder, SignedSecretKey,
        },
        smallvec::{smallvec, SmallVec},
    };

    fn create_signing_key() -> (SignedSecretKey, SignedPublicKey) {
        let mut params = SecretKeyParamsBuilder::default();
        params
            .key_type(KeyType::Rsa(2048))
            .preferred_symmetric_algorithms(smallvec![SymmetricKeyAlgorithm::AES256])
            .preferred_hash_algorithms(smallvec![HashAlgorithm::SHA2_256])
            .preferred_compression_algorithms(smallvec![CompressionAlgorithm::ZLIB])
            .can_create_certificates(false)
            .can_sign(true)
            .primary_user_id("Archive Test <test@example.com>".to_string());

        let secret_key = params.build().unwrap().generate().unwrap();
        let secret_key_signed = secret_key.sign(String::new).unwrap();

        let public_key = secret_key_signed.public_key();
        let public_key_signed = public_key.sign(&secret_key_signed, String::new).unwrap();

        (secret_key_signed, public_key_signed)
    }

    fn sign_detached(key: &SignedSecretKey, content: &[u8]) -> Vec<u8> {
        let hashed_subpackets = vec![
            Subpacket::IssuerFingerprint(KeyVersion::V4, SmallVec::from_slice(&key.fingerprint())),
            Subpacket::SignatureCreationTime(chrono::Utc::now().trunc_subsecs(0)),
        ];
        let unhashed_subpackets = vec![Subpacket::Issuer(key.key_id())];

        let config = SignatureConfig::new_v4(
            Default::default(),
            SignatureType::Binary,
            key.algorithm(),
            HashAlgorithm::SHA2_256,
            hashed_subpackets,
            unhashed_subpackets,
        );

        let signature = config.sign(key, String::new, Cursor::new(content)).unwrap();

        let mut writer = Cursor::new(Vec::<u8>::new());
        pgp::armor::write(
            &Packet::Signature(signature),
            pgp::armor::BlockType::Signature,
            &mut writer,
            None,
        )
        .unwrap();

        writer.into_inner()
    }

    #[test]
    fn load_armored_keyring() -> Result<()> {
        let (_, public_key) = create_signing_key();

        let td = tempfile::tempdir()?;
        let keyring_path = td.path().join("archive-keyring.asc");
        fs::write(
            &keyring_path,
            public_key.to_armored_string(None).unwrap(),
        )?;

        let keyring = Keyring::load(&keyring_path)?;
        assert_eq!(keyring.len(), 1);

        Ok(())
    }

    #[test]
    fn garbage_keyring_rejected() -> Result<()> {
        let td = tempfile::tempdir()?;
        let keyring_path = td.path().join("bogus.gpg");
        fs::write(&keyring_path, b"")?;

        assert!(Keyring::load(&keyring_path).is_err());

        Ok(())
    }

    #[test]
    fn detached_signature_round_trip() -> Result<()> {
        let (secret_key, public_key) = create_signing_key();

        let td = tempfile::tempdir()?;
        let release_path = td.path().join("Release");
        let signature_path = td.path().join("Release.gpg");
        let keyring_path = td.path().join("archive-keyring.asc");

        let content = b"Suite: jammy\nCodename: jammy\n";
        fs::write(&release_path, content)?;
        fs::write(&signature_path, sign_detached(&secret_key, content))?;
        fs::write(
            &keyring_path,
            public_key.to_armored_string(None).unwrap(),
        )?;

        let keyring = Keyring::load(&keyring_path)?;
        verify_detached(&release_path, &signature_path, &keyring)?;

        // A tampered Release must not verify.
        fs::write(&release_path, b"Suite: jammy\nCodename: evil\n")?;
        let err = verify_detached(&release_path, &signature_path, &keyring).unwrap_err();
        assert!(matches!(err, DebrootError::SignatureInvalid(_)));
        assert!(err.to_string().contains("Release"));

        Ok(())
    }

    #[test]
    fn signature_from_unrelated_key_rejected() -> Result<()> {
        let (secret_key, _) = create_signing_key();
        let (_, other_public_key) = create_signing_key();

        let td = tempfile::tempdir()?;
        let release_path = td.path().join("Release");
        let signature_path = td.path().join("Release.gpg");
        let keyring_path = td.path().join("archive-keyring.asc");

        let content = b"Suite: jammy\n";
        fs::write(&release_path, content)?;
        fs::write(&signature_path, sign_detached(&secret_key, content))?;
        fs::write(
            &keyring_path,
            other_public_key.to_armored_string(None).unwrap(),
        )?;

        let keyring = Keyring::load(&keyring_path)?;
        assert!(verify_detached(&release_path, &signature_path, &keyring).is_err());

        Ok(())
    }
}
