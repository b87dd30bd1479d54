#[actix_web::main]
async fn main() {
    if let Err(e) = contact_bridge_lib::run().await {
        eprintln!("contact-bridge failed: {}", e);
        std::process::exit(1);
    }
}
