use autofactory::{auto_factory, FactoryBuilder, FactoryContract, ResolveError};

pub trait Widget: Send {}

pub struct Gear;

#[auto_factory]
pub trait WidgetFactory: Send + Sync {
    fn get_widget(&self, size: u32, label: String) -> Result<Box<dyn Widget>, ResolveError>;
    fn get_spare_widget(&self) -> Result<Box<dyn Widget>, ResolveError>;
    fn get_gear(&self) -> Result<Gear, ResolveError>;
}

#[auto_factory]
pub(crate) trait EmptyFactory {}

fn main() {
    let descriptor = WidgetFactoryContract::descriptor();
    assert_eq!(descriptor.name(), "WidgetFactory");
    assert_eq!(descriptor.methods().count(), 3);

    let builder = FactoryBuilder::default();
    assert!(builder.factory_type::<WidgetFactoryContract>().is_ok());
    assert!(builder.factory_type::<EmptyFactoryContract>().is_ok());
}
