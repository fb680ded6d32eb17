#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gym_class_api::run().await
}
