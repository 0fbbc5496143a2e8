#[tokio::main]
async fn main() {
    wedding_booking::run().await;
}
