//! Static copy for the landing page: header, hero panel, login card.

use crate::navigation::DASHBOARD_PATH;

/// A link in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavLink {
    pub label: &'static str,
    pub path: &'static str,
}

/// One bullet in the hero panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

pub const BRAND: &str = "WME";
pub const PRODUCT: &str = "Client Portal";

pub const HERO_HEADLINE: &str = "Streamline Your Event Experience";
pub const HERO_TAGLINE: &str = "Access all your event details, documents, and communications in one secure, centralized hub.";

pub const HERO_FEATURES: [Feature; 3] = [
    Feature {
        title: "Personalized Dashboard",
        description: "View your event timeline, manage bookings, and stay up-to-date.",
    },
    Feature {
        title: "Secure Document Handling",
        description: "Upload and access contracts, invoices, and other important files.",
    },
    Feature {
        title: "Direct Communication",
        description: "Communicate with your event coordinator and receive important updates.",
    },
];

pub const NAV_LINKS: [NavLink; 2] = [
    NavLink {
        label: "Terms",
        path: "/terms",
    },
    NavLink {
        label: "Privacy",
        path: "/privacy",
    },
];

/// The header's call-to-action button.
pub const CLIENT_LOGIN: NavLink = NavLink {
    label: "Client Login",
    path: DASHBOARD_PATH,
};

/// Copy on the login card and its sibling tab.
pub mod login_card {
    pub const TAB_LOGIN: &str = "Client Access";
    pub const TAB_BOOKING: &str = "New Booking";
    pub const TITLE: &str = "Secure Client Login";
    pub const DESCRIPTION: &str = "Enter your 8-character Booking ID to access your portal.";
    pub const FIELD_LABEL: &str = "Booking ID";
    pub const PLACEHOLDER: &str = "e.g. WME12345";
    pub const FOOTER: &str = "By logging in, you agree to our Terms of Service and Privacy Policy.";
    pub const BOOKING_TITLE: &str = "New Event Booking";
    pub const BOOKING_DESCRIPTION: &str = "This feature is coming soon. Please check back later.";
    pub const COMING_SOON: &str = "Coming Soon";
}
