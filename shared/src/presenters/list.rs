use serde::{Deserialize, Serialize};

use super::{Freshness, WebcamCard};
use crate::catalog::CatalogStore;
use crate::model::{SectionId, WebcamId};
use crate::navigation::NavigationRequest;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarouselRow {
    pub section_id: SectionId,
    pub title: String,
    pub webcams: Vec<WebcamCard>,
    /// Last row of the carousel; the shell drops the separator under it.
    pub is_last: bool,
}

/// Carousel of every section, in presentation order.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListPresenter;

impl ListPresenter {
    #[must_use]
    pub fn rows(&self, catalog: &CatalogStore, freshness: Freshness) -> Vec<CarouselRow> {
        let sections = catalog.all_sections();
        sections
            .iter()
            .enumerate()
            .map(|(i, section)| CarouselRow {
                section_id: section.id.clone(),
                title: section.title.clone(),
                webcams: section
                    .sorted_webcams(catalog)
                    .map(|w| WebcamCard::new(w, freshness))
                    .collect(),
                is_last: i + 1 == sections.len(),
            })
            .collect()
    }

    #[must_use]
    pub fn select_section(
        &self,
        catalog: &CatalogStore,
        section_id: &SectionId,
    ) -> Option<NavigationRequest> {
        catalog
            .section(section_id)
            .map(|s| NavigationRequest::ShowSection {
                section_id: s.id.clone(),
            })
    }

    #[must_use]
    pub fn select_webcam(
        &self,
        catalog: &CatalogStore,
        webcam_id: &WebcamId,
    ) -> Option<NavigationRequest> {
        catalog
            .webcam(webcam_id)
            .map(|w| NavigationRequest::ShowWebcam {
                webcam_id: w.id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::{order, sample_seed};
    use crate::presenters::test_freshness;
    use crate::storage::MemoryStorage;

    fn store() -> CatalogStore {
        CatalogStore::load(&MemoryStorage::with_catalog(sample_seed()), order()).unwrap()
    }

    #[test]
    fn rows_follow_sections_and_flag_last() {
        let catalog = store();
        let rows = ListPresenter.rows(&catalog, test_freshness());

        let ids: Vec<_> = rows.iter().map(|r| r.section_id.as_str()).collect();
        assert_eq!(ids, vec!["pdd", "sancy", "lioran"]);
        let last: Vec<_> = rows.iter().map(|r| r.is_last).collect();
        assert_eq!(last, vec![false, false, true]);

        let pdd: Vec<_> = rows[0].webcams.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(pdd, vec!["pdd-chaine", "pdd-antenne", "pdd-summit"]);
        assert_eq!(
            rows[0].webcams[2].image_url.as_deref(),
            Some("https://cams.example/pdd-hd.jpg")
        );
        assert!(rows[0].webcams.iter().all(|c| c.is_outdated));
    }

    #[test]
    fn selecting_a_section_navigates_to_its_grid() {
        let catalog = store();
        assert_eq!(
            ListPresenter.select_section(&catalog, &SectionId::new("sancy")),
            Some(NavigationRequest::ShowSection {
                section_id: SectionId::new("sancy")
            })
        );
        assert_eq!(ListPresenter.select_section(&catalog, &SectionId::new("x")), None);
    }

    #[test]
    fn selecting_a_webcam_navigates_to_detail() {
        let catalog = store();
        assert_eq!(
            ListPresenter.select_webcam(&catalog, &WebcamId::new("sancy-lac")),
            Some(NavigationRequest::ShowWebcam {
                webcam_id: WebcamId::new("sancy-lac")
            })
        );
        assert_eq!(ListPresenter.select_webcam(&catalog, &WebcamId::new("x")), None);
    }

    #[test]
    fn empty_catalog_has_no_rows() {
        let catalog = CatalogStore::new(order());
        assert!(ListPresenter.rows(&catalog, test_freshness()).is_empty());
    }
}
