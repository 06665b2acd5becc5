//! TLS setup for the Client API.
//!
//! The client serves HTTPS and WSS on loopback with a certificate issued by its
//! own root and not valid for `127.0.0.1`. [`TransportSecurity`] selects how
//! that certificate is treated and builds one `rustls` configuration shared by
//! the REST client and the WebSocket connector.

use std::path::Path;
use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{CryptoProvider, WebPkiSupportedAlgorithms};
use rustls::pki_types::pem::PemObject;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::server::ParsedCertificate;
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};

use crate::error::{Error, Result};

/// How the loopback endpoint's certificate is handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransportSecurity {
	/// No TLS: `ws://` and `http://`. Local tooling and tests.
	Plain,
	/// TLS with any server certificate accepted; handshake signatures are still checked.
	#[default]
	Insecure,
	/// TLS with the chain verified against this PEM root. Host name mismatch is tolerated.
	Pinned(Arc<str>),
}

impl TransportSecurity {
	/// Reads a PEM root certificate for [`TransportSecurity::Pinned`].
	pub fn pinned_from_file(path: impl AsRef<Path>) -> Result<Self> {
		let pem = std::fs::read_to_string(path.as_ref())?;
		let security = Self::Pinned(Arc::from(pem));
		// Fail early on a bad file instead of at the first connect.
		security.client_config()?;
		Ok(security)
	}

	pub fn is_tls(&self) -> bool {
		!matches!(self, Self::Plain)
	}

	pub fn ws_scheme(&self) -> &'static str {
		if self.is_tls() { "wss" } else { "ws" }
	}

	pub fn http_scheme(&self) -> &'static str {
		if self.is_tls() { "https" } else { "http" }
	}

	/// Builds the `rustls` client configuration, `None` for [`TransportSecurity::Plain`].
	pub fn client_config(&self) -> Result<Option<Arc<ClientConfig>>> {
		let provider = Arc::new(rustls::crypto::ring::default_provider());
		let verifier: Arc<dyn ServerCertVerifier> = match self {
			Self::Plain => return Ok(None),
			Self::Insecure => Arc::new(AcceptAnyCert::new(&provider)),
			Self::Pinned(pem) => Arc::new(PinnedRootVerifier::from_pem(pem, &provider)?),
		};

		let config = ClientConfig::builder_with_provider(provider)
			.with_safe_default_protocol_versions()
			.map_err(|e| Error::Tls(e.to_string()))?
			.dangerous()
			.with_custom_certificate_verifier(verifier)
			.with_no_client_auth();
		Ok(Some(Arc::new(config)))
	}
}

#[derive(Debug)]
struct AcceptAnyCert {
	algorithms: WebPkiSupportedAlgorithms,
}

impl AcceptAnyCert {
	fn new(provider: &CryptoProvider) -> Self {
		Self {
			algorithms: provider.signature_verification_algorithms,
		}
	}
}

impl ServerCertVerifier for AcceptAnyCert {
	fn verify_server_cert(
		&self,
		_end_entity: &CertificateDer<'_>,
		_intermediates: &[CertificateDer<'_>],
		_server_name: &ServerName<'_>,
		_ocsp_response: &[u8],
		_now: UnixTime,
	) -> std::result::Result<ServerCertVerified, rustls::Error> {
		Ok(ServerCertVerified::assertion())
	}

	fn verify_tls12_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
		rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
	}

	fn verify_tls13_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
		rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
	}

	fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
		self.algorithms.supported_schemes()
	}
}

/// Verifies the chain against a single pinned root and skips the name check.
#[derive(Debug)]
struct PinnedRootVerifier {
	roots: RootCertStore,
	algorithms: WebPkiSupportedAlgorithms,
}

impl PinnedRootVerifier {
	fn from_pem(pem: &str, provider: &CryptoProvider) -> Result<Self> {
		let mut roots = RootCertStore::empty();
		for cert in CertificateDer::pem_slice_iter(pem.as_bytes()) {
			let cert = cert.map_err(|e| Error::Tls(format!("invalid pinned certificate: {e}")))?;
			roots
				.add(cert)
				.map_err(|e| Error::Tls(format!("unusable pinned certificate: {e}")))?;
		}
		if roots.is_empty() {
			return Err(Error::Tls("pinned certificate file contains no certificates".into()));
		}
		Ok(Self {
			roots,
			algorithms: provider.signature_verification_algorithms,
		})
	}
}

impl ServerCertVerifier for PinnedRootVerifier {
	fn verify_server_cert(
		&self,
		end_entity: &CertificateDer<'_>,
		intermediates: &[CertificateDer<'_>],
		_server_name: &ServerName<'_>,
		_ocsp_response: &[u8],
		now: UnixTime,
	) -> std::result::Result<ServerCertVerified, rustls::Error> {
		let cert = ParsedCertificate::try_from(end_entity)?;
		rustls::client::verify_server_cert_signed_by_trust_anchor(
			&cert,
			&self.roots,
			intermediates,
			now,
			self.algorithms.all,
		)?;
		Ok(ServerCertVerified::assertion())
	}

	fn verify_tls12_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
		rustls::crypto::verify_tls12_signature(message, cert, dss, &self.algorithms)
	}

	fn verify_tls13_signature(
		&self,
		message: &[u8],
		cert: &CertificateDer<'_>,
		dss: &DigitallySignedStruct,
	) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
		rustls::crypto::verify_tls13_signature(message, cert, dss, &self.algorithms)
	}

	fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
		self.algorithms.supported_schemes()
	}
}
