use component_macros::component;
use infrastructure_common::{Discoverable, Lifetime};

#[component(transient, tag = "ok")]
struct OkService;

fn main() {
    let metadata = OkService::component_metadata();
    assert_eq!(metadata.lifetime, Some(Lifetime::Transient));
    assert!(OkService::service_id().as_str().ends_with("::OkService"));
}
