use rand::Rng;

/// Produces short human-readable confirmation codes.
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// 8 upper-case hex characters from 4 random bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCodeGenerator;

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        let bytes: [u8; 4] = rand::thread_rng().gen();
        bytes.iter().map(|b| format!("{:02X}", b)).collect()
    }
}
