use ddd_domain::domain_type::DomainType;
use ddd_macros::domain_type;

#[domain_type]
enum Shelf {
    #[value(name = "top-shelf")]
    Top,
    Bottom,
}

fn main() {
    assert_eq!(Shelf::Top.name(), "top-shelf");
    assert_eq!(Shelf::Bottom.to_string(), "Bottom");
    assert_eq!(Shelf::all(), &[Shelf::Top, Shelf::Bottom]);
    assert_eq!(Shelf::from_name("TOP-SHELF", true), Some(Shelf::Top));
}
