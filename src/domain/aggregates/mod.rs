//! Aggregates module
pub mod cart;
pub mod category;
pub mod charity;
pub mod discount;
pub mod donation;
pub mod order;
pub mod product;
pub mod returns;
pub mod seller;

pub use cart::{Cart, CartError, CartLine, CartView};
pub use category::Category;
pub use charity::{Charity, CharityDonation, CharityDonationStatus, CharityForm, CharityListing};
pub use discount::{DiscountCode, DiscountCodeForm, DiscountKind, DiscountOffer, DiscountRejection, DiscountUsage};
pub use donation::{DonationForm, DonationStats, DonationStatus, GoodsDonation};
pub use order::{Order, OrderAmounts, OrderError, OrderItem, OrderStatus, PaymentStatus};
pub use product::{Product, ProductCard, ProductDraft, ProductError, StockStatus};
pub use returns::{ReturnReason, ReturnRequest, ReturnStatus, ReturnableOrder};
pub use seller::{Seller, SellerProfilePatch, SellerRegistration, StoreSettings, StoreSettingsPatch};
