pub mod account;
pub mod catalog;
pub mod ledger;
pub mod mission;
pub mod rank;
pub mod redemption;
pub mod wish;

pub use account::{Account, AccountName, Role, RoleAccount};
pub use catalog::{Banner, BannerLayout, PointReason, Product, ProductCategory, ProductDraft};
pub use ledger::{
    Collection, CollectionSnapshot, DocKey, Expectation, ReadKey, ReadResult, StoreWrite,
    Subscription, VersionedDocument,
};
pub use mission::{
    ApprovedSubmission, CompletionRecord, Mission, MissionClaim, MissionDraft, MissionSubmission, MissionSuggestion,
    MissionTier, PendingClaim, SubmissionStatus,
};
pub use rank::{Rank, RankStanding};
pub use redemption::{Redemption, RedemptionReceipt, RedemptionStatus, RefundPolicy};
pub use wish::{LikeOutcome, Wish};
