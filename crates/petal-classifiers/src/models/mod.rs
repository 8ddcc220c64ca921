pub mod svm;

pub use svm::SVMClassifier;
