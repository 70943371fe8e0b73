//! Tenant id generation.

use tenantiq_core::models::tenant::TenantId;

/// Generate a fresh tenant id: 128 random bits, hex-encoded
/// (32 lowercase characters).
pub fn generate_id() -> TenantId {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rand::Rng::random(&mut rng);
    TenantId::new(hex::encode(bytes))
}
