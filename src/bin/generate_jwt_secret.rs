use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;

fn main() {
    println!("🔐 ViraExpress JWT secret generator");
    println!("===================================");

    // 256-bit key from the thread-local CSPRNG
    let mut key = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key);

    println!();
    println!("📝 Add this line to your .env file:");
    println!("JWT_SECRET={}", STANDARD.encode(key));
}
