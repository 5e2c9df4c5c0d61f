use component_macros::component;

#[component(priority = 5)]
struct LegacyService;

fn main() {}
