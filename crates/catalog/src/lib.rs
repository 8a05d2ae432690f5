//! Product catalog: categories, products, price lists and the POS product lookup.

pub mod category;
pub mod price_list;
pub mod product;
pub mod search;

pub use category::{Category, CategoryDraft, CategoryPatch, ancestry, relevel_descendants};
pub use price_list::{PriceList, PriceListDraft, PriceListPatch, ProductPrice};
pub use product::{Product, ProductDraft, ProductPatch};
pub use search::{ProductQuery, sellable_products};
