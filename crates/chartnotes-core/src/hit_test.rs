#![forbid(unsafe_code)]

//! Card hit testing.
//!
//! This is the single definition of a card's on-screen bounds. Hover,
//! click routing, drag start, and the render snapshot all go through
//! [`card_bounds`] or [`HitTester::message_at`].

use crate::coords::ChartCoordinates;
use crate::geometry::{CardBox, ScreenPoint};
use crate::message::Message;
use crate::options::CardLayout;
use crate::resolver::AnchorResolver;

/// Bounds of a message's card this frame, or `None` if its anchor is out of
/// the visible range.
#[must_use]
pub fn card_bounds(
    message: &Message,
    resolver: &AnchorResolver,
    coords: &impl ChartCoordinates,
    layout: &CardLayout,
) -> Option<CardBox> {
    resolver
        .resolve_point(message, coords)
        .map(|origin| layout.bounds_at(origin))
}

/// Borrowed view of everything needed to locate cards.
#[derive(Debug)]
pub struct HitTester<'a, C> {
    pub resolver: &'a AnchorResolver,
    pub coords: &'a C,
    pub layout: CardLayout,
}

impl<'a, C: ChartCoordinates> HitTester<'a, C> {
    #[must_use]
    pub const fn new(resolver: &'a AnchorResolver, coords: &'a C, layout: CardLayout) -> Self {
        Self {
            resolver,
            coords,
            layout,
        }
    }

    /// First message in iteration order whose card contains `point`.
    ///
    /// Later cards never occlude earlier ones here. Messages whose anchor
    /// does not resolve are skipped.
    pub fn message_at<'m, I>(&self, messages: I, point: ScreenPoint) -> Option<&'m Message>
    where
        I: IntoIterator<Item = &'m Message>,
    {
        messages.into_iter().find(|message| {
            card_bounds(message, self.resolver, self.coords, &self.layout)
                .is_some_and(|bounds| bounds.contains(point))
        })
    }

    #[must_use]
    pub fn bounds_of(&self, message: &Message) -> Option<CardBox> {
        card_bounds(message, self.resolver, self.coords, &self.layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::LinearCoordinates;
    use crate::geometry::PixelOffset;
    use crate::message::Anchor;
    use crate::resolver::DraggableResolver;

    fn layout() -> CardLayout {
        CardLayout {
            width: 100.0,
            padding: 5.0,
            line_height: 10.0,
        }
    }

    fn coords() -> LinearCoordinates {
        LinearCoordinates::unbounded(1.0, 1.0, 0.0).with_time_range(0.0, 500.0)
    }

    /// Value `v` maps to `y = -v`, so anchors use negated values.
    fn at(id: &str, x: f64, y: f64) -> Message {
        Message::new(id, Anchor::new(x, -y))
    }

    #[test]
    fn box_spans_width_and_derived_height() {
        let resolver = AnchorResolver::Fixed;
        let coords = coords();
        let tester = HitTester::new(&resolver, &coords, layout());
        let message = at("a", 10.0, 20.0);
        assert_eq!(
            tester.bounds_of(&message),
            Some(CardBox::new(10.0, 20.0, 100.0, 40.0))
        );
        let messages = [message];
        assert!(tester.message_at(&messages, ScreenPoint::new(110.0, 60.0)).is_some());
        assert!(tester.message_at(&messages, ScreenPoint::new(110.5, 60.0)).is_none());
    }

    #[test]
    fn first_match_in_insertion_order_wins() {
        let resolver = AnchorResolver::Fixed;
        let coords = coords();
        let tester = HitTester::new(&resolver, &coords, layout());
        let messages = [at("first", 0.0, 0.0), at("second", 50.0, 10.0)];
        let hit = tester.message_at(&messages, ScreenPoint::new(60.0, 20.0));
        assert_eq!(hit.map(|m| m.id.as_str()), Some("first"));
        let hit = tester.message_at(&messages, ScreenPoint::new(140.0, 45.0));
        assert_eq!(hit.map(|m| m.id.as_str()), Some("second"));
    }

    #[test]
    fn unresolvable_messages_are_skipped() {
        let resolver = AnchorResolver::Fixed;
        let coords = coords();
        let tester = HitTester::new(&resolver, &coords, layout());
        let messages = [at("offscreen", 900.0, 0.0)];
        assert!(tester.message_at(&messages, ScreenPoint::new(900.0, 0.0)).is_none());
        assert!(tester.bounds_of(&messages[0]).is_none());
    }

    #[test]
    fn hit_testing_follows_drag_offset() {
        let message = at("a", 0.0, 0.0);
        let mut draggable = DraggableResolver::new();
        draggable.begin_drag(&message, ScreenPoint::new(0.0, 0.0));
        draggable.continue_drag(&message, ScreenPoint::new(200.0, 0.0));
        let resolver = AnchorResolver::Draggable(draggable);
        let coords = coords();
        let tester = HitTester::new(&resolver, &coords, layout());
        let messages = [message];
        assert!(tester.message_at(&messages, ScreenPoint::new(50.0, 10.0)).is_none());
        assert!(tester.message_at(&messages, ScreenPoint::new(250.0, 10.0)).is_some());
        assert_eq!(
            resolver.offset(&messages[0].id),
            Some(PixelOffset::new(200.0, 0.0))
        );
    }
}
