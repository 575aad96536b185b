#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct PaneNode {
    pub index: usize,
    pub note_id: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StackAction {
    ScrollTo(usize),
    Opened(usize),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaneStack {
    nodes: Vec<PaneNode>,
}

impl PaneStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let nodes = ids
            .into_iter()
            .enumerate()
            .map(|(index, note_id)| PaneNode { index, note_id })
            .collect();
        Self { nodes }
    }

    pub fn nodes(&self) -> &[PaneNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, note_id: &str) -> Option<usize> {
        self.nodes
            .iter()
            .find(|node| node.note_id == note_id)
            .map(|node| node.index)
    }

    pub fn open_root(&mut self, note_id: impl Into<String>) -> StackAction {
        self.nodes = vec![PaneNode {
            index: 0,
            note_id: note_id.into(),
        }];
        StackAction::Opened(0)
    }

    // A note that is already open anywhere in the stack is only brought back
    // into view; panes after it stay in place. Otherwise the forward path
    // past the requesting pane is overwritten.
    pub fn request_note(&mut self, from_index: usize, note_id: &str) -> StackAction {
        if let Some(index) = self.find(note_id) {
            return StackAction::ScrollTo(index);
        }

        let index = (from_index + 1).min(self.nodes.len());
        self.nodes.truncate(index);
        self.nodes.push(PaneNode {
            index,
            note_id: note_id.to_string(),
        });
        StackAction::Opened(index)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|node| node.note_id.as_str()).collect()
    }

    pub fn to_href(&self) -> String {
        let mut ids = self.nodes.iter().map(|node| node.note_id.as_str());
        let root = ids.next().unwrap_or_default();
        let rest = ids.collect::<Vec<_>>();
        if rest.is_empty() {
            format!("/{root}")
        } else {
            format!("/{root}?ids={}", rest.join(","))
        }
    }

    pub fn parse_href(pathname: &str, search: &str, default_root: &str) -> Self {
        let root = pathname
            .split('/')
            .map(str::trim)
            .find(|part| !part.is_empty())
            .unwrap_or(default_root);

        let mut ids = vec![root.to_string()];
        ids.extend(stacked_ids(search));
        Self::from_ids(ids)
    }
}

fn stacked_ids(search: &str) -> Vec<String> {
    search
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.strip_prefix("ids="))
        .flat_map(|joined| joined.split(','))
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stack_of(ids: &[&str]) -> PaneStack {
        PaneStack::from_ids(ids.iter().map(|id| id.to_string()))
    }

    #[test]
    fn truncates_forward_panes_when_opening_new_note() {
        let mut stack = stack_of(&["a", "b", "c"]);
        let action = stack.request_note(1, "d");
        assert_eq!(action, StackAction::Opened(2));
        assert_eq!(stack.ids(), vec!["a", "b", "d"]);
    }

    #[test]
    fn reusing_open_note_keeps_forward_panes() {
        let mut stack = stack_of(&["a", "b", "c"]);
        let action = stack.request_note(2, "a");
        assert_eq!(action, StackAction::ScrollTo(0));
        assert_eq!(stack.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn open_root_replaces_whole_stack() {
        let mut stack = stack_of(&["a", "b"]);
        assert_eq!(stack.open_root("z"), StackAction::Opened(0));
        assert_eq!(stack.ids(), vec!["z"]);
    }

    #[test]
    fn indices_stay_contiguous_after_mutations() {
        let mut stack = stack_of(&["a"]);
        stack.request_note(0, "b");
        stack.request_note(1, "c");
        stack.request_note(0, "d");
        let indices: Vec<usize> = stack.nodes().iter().map(|node| node.index).collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(stack.ids(), vec!["a", "d"]);
    }

    #[test]
    fn appending_from_last_pane_grows_the_stack() {
        let mut stack = stack_of(&["a", "b"]);
        let action = stack.request_note(1, "c");
        assert_eq!(action, StackAction::Opened(2));
        assert_eq!(stack.ids(), vec!["a", "b", "c"]);
    }

    #[test]
    fn serializes_root_and_stacked_ids() {
        assert_eq!(stack_of(&["a"]).to_href(), "/a");
        assert_eq!(stack_of(&["a", "b", "c"]).to_href(), "/a?ids=b,c");
    }

    #[test]
    fn parses_path_and_query_back_into_a_stack() {
        let stack = PaneStack::parse_href("/a", "?ids=b,c", "home");
        let nodes: Vec<(usize, &str)> = stack
            .nodes()
            .iter()
            .map(|node| (node.index, node.note_id.as_str()))
            .collect();
        assert_eq!(nodes, vec![(0, "a"), (1, "b"), (2, "c")]);
    }

    #[test]
    fn round_trips_through_href() {
        let stack = stack_of(&["a", "b", "c"]);
        let href = stack.to_href();
        let (path, query) = match href.split_once('?') {
            Some((path, query)) => (path, format!("?{query}")),
            None => (href.as_str(), String::new()),
        };
        assert_eq!(PaneStack::parse_href(path, &query, "home"), stack);
    }

    #[test]
    fn falls_back_to_default_root_and_filters_empty_segments() {
        assert_eq!(PaneStack::parse_href("/", "", "home").ids(), vec!["home"]);
        assert_eq!(
            PaneStack::parse_href("", "?ids=,b,,c,", "home").ids(),
            vec!["home", "b", "c"]
        );
        assert_eq!(
            PaneStack::parse_href("/ ", "?other=1", "home").ids(),
            vec!["home"]
        );
    }
}
