//! Client-side cart and wishlist stores.
//!
//! Each store keeps a local copy of a server-owned collection, applies
//! changes once the backend confirms them, and persists the collection so a
//! restart shows the last known contents before the first fetch completes.

pub mod cart;
pub mod wishlist;

#[cfg(test)]
mod testing;

pub use cart::{CartRequest, CartResponse, CartState, CartStore, PersistedCart};
pub use wishlist::{
    PersistedWishlist, WishlistRequest, WishlistResponse, WishlistState, WishlistStore,
};
