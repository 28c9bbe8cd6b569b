//! TLS front-end configuration.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Load the server certificate chain and private key (both PEM).
///
/// ALPN advertises `h2` then `http/1.1`.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, io::Error> {
    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if !path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{what} file not found: {}", path.display()),
            ));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
