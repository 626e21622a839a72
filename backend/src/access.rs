//! Gated post visibility and unlocks.

use crate::models::{Post, PostView};

/// A post is visible when it is ungated, when the viewer owns it, or when the
/// viewer's wallet has been granted access.
pub fn can_view(post: &Post, owner_wallet: &str, viewer: Option<&str>) -> bool {
    if !post.is_gated {
        return true;
    }
    match viewer {
        Some(wallet) => wallet == owner_wallet || post.accessible_by.iter().any(|w| w == wallet),
        None => false,
    }
}

/// Projects a post for one viewer, stripping content the viewer has not unlocked.
pub fn view_for(post: &Post, owner_wallet: &str, viewer: Option<&str>) -> PostView {
    let visible = can_view(post, owner_wallet, viewer);
    PostView {
        id: post.id,
        creator_id: post.creator_id,
        status_text: visible.then(|| post.status_text.clone()),
        image_url: if visible { post.image_url.clone() } else { None },
        is_gated: post.is_gated,
        price: post.price,
        locked: !visible,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// Unlocking is only meaningful for a gated post the viewer cannot already see.
pub fn needs_payment(post: &Post, owner_wallet: &str, wallet: &str) -> bool {
    !can_view(post, owner_wallet, Some(wallet))
}
